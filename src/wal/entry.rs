//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TodoError};
use crate::item::Item;

/// Frame header: LSN (8) + CRC (4) + data length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest data section accepted when reading (16 MB)
pub const MAX_ENTRY_SIZE: u32 = 16 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to replay
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// A newly created item
    Insert(Item),

    /// The full state of an item after an update
    Update(Item),

    /// Removal of an item
    Delete { id: u64 },

    /// Lower bound for the next id to assign (written by compaction so
    /// ids of deleted items are never handed out again)
    Sequence { next_id: u64 },
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Serialize into a framed record: header + data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)
            .map_err(|e| TodoError::Serialization(e.to_string()))?;

        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(TodoError::LogWrite(format!(
                "Entry too large: {} bytes (max {})",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut frame = Vec::with_capacity(HEADER_SIZE + data.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&Self::compute_crc(&data).to_le_bytes());
        frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
        frame.extend_from_slice(&data);

        Ok(frame)
    }

    /// Deserialize one framed record from the front of `bytes`
    ///
    /// Returns the entry and the number of bytes consumed.
    pub fn deserialize(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(TodoError::LogCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let header = parse_header(&bytes[..HEADER_SIZE]);
        if header.len > MAX_ENTRY_SIZE {
            return Err(TodoError::LogCorruption(format!(
                "Entry too large: {} bytes (max {})",
                header.len, MAX_ENTRY_SIZE
            )));
        }

        let total_len = HEADER_SIZE + header.len as usize;
        if bytes.len() < total_len {
            return Err(TodoError::LogCorruption(format!(
                "Incomplete entry: expected {} bytes, got {}",
                total_len,
                bytes.len()
            )));
        }

        let entry = Self::decode_data(&header, &bytes[HEADER_SIZE..total_len])?;
        Ok((entry, total_len))
    }

    /// Validate and decode the data section against its header
    pub(crate) fn decode_data(header: &FrameHeader, data: &[u8]) -> Result<Self> {
        let actual_crc = Self::compute_crc(data);
        if actual_crc != header.crc {
            return Err(TodoError::LogCorruption(format!(
                "CRC mismatch at lsn {}: expected {:#010x}, got {:#010x}",
                header.lsn, header.crc, actual_crc
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| TodoError::LogCorruption(format!("lsn {}: {}", header.lsn, e)))?;

        if entry.lsn != header.lsn {
            return Err(TodoError::LogCorruption(format!(
                "LSN mismatch: header says {}, entry says {}",
                header.lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    /// CRC32 of a data section
    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

/// Decoded frame header
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

pub(crate) fn parse_header(bytes: &[u8]) -> FrameHeader {
    let mut lsn = [0u8; 8];
    lsn.copy_from_slice(&bytes[0..8]);
    let mut crc = [0u8; 4];
    crc.copy_from_slice(&bytes[8..12]);
    let mut len = [0u8; 4];
    len.copy_from_slice(&bytes[12..16]);

    FrameHeader {
        lsn: u64::from_le_bytes(lsn),
        crc: u32::from_le_bytes(crc),
        len: u32::from_le_bytes(len),
    }
}
