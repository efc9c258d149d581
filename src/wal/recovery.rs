//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{Result, TodoError};
use super::reader::unframed_error;
use super::{WalEntry, WalReader, WalRecord};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL ends in a partial write (removed by `recover`)
    pub was_truncated: bool,

    /// Offset of a record that cannot be framed; nothing from there on
    /// was read
    pub unframed_at: Option<u64>,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Detect and skip corrupted entries
    /// 3. Truncate partial writes at end
    /// 4. Return all valid entries in order
    ///
    /// A record with an impossible length fails recovery and leaves the
    /// file as it is: the records behind it may still be intact.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, result, valid_len) = Self::scan(path)?;

        if let Some(offset) = result.unframed_at {
            return Err(TodoError::LogCorruption(format!(
                "{}: unframeable record at offset {} after {} good entries; refusing to truncate",
                path.display(),
                offset,
                result.entries_recovered
            )));
        }

        if result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
            tracing::warn!(
                "Truncated partial write in {} at offset {}",
                path.display(),
                valid_len
            );
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult, u64)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        while let Some(record) = reader.next_record()? {
            match record {
                WalRecord::Entry(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = result.last_lsn.max(entry.lsn);
                    entries.push(entry);
                }
                WalRecord::Corrupted { lsn, reason } => {
                    tracing::warn!("Skipping corrupted log entry (lsn {}): {}", lsn, reason);
                    result.entries_corrupted += 1;
                }
                WalRecord::Torn => {
                    result.was_truncated = true;
                    break;
                }
                WalRecord::Unframed { offset, len } => {
                    tracing::error!("{}", unframed_error(offset, len));
                    result.entries_corrupted += 1;
                    result.unframed_at = Some(offset);
                    break;
                }
            }
        }

        Ok((entries, result, reader.position()))
    }
}
