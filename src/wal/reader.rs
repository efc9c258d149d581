//! WAL Reader
//!
//! Handles reading framed entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, TodoError};
use super::entry::{parse_header, HEADER_SIZE, MAX_ENTRY_SIZE};
use super::WalEntry;

/// Outcome of reading one record
#[derive(Debug)]
pub enum WalRecord {
    /// A complete record with a valid checksum
    Entry(WalEntry),

    /// A complete record whose data failed validation (skipped)
    Corrupted { lsn: u64, reason: String },

    /// The file ends in the middle of a record (torn write)
    Torn,

    /// A complete header whose length no writer produces; the records
    /// after it cannot be located
    Unframed { offset: u64, len: u32 },
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last complete record
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at a clean end of file.
    pub fn next_record(&mut self) -> Result<Option<WalRecord>> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        let read = read_fully(&mut self.reader, &mut header_bytes)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Ok(Some(WalRecord::Torn));
        }

        let header = parse_header(&header_bytes);
        // A torn append leaves a short header or short data, never a full
        // header with an impossible length
        if header.len > MAX_ENTRY_SIZE {
            return Ok(Some(WalRecord::Unframed {
                offset: self.position,
                len: header.len,
            }));
        }

        let mut data = vec![0u8; header.len as usize];
        if read_fully(&mut self.reader, &mut data)? < data.len() {
            return Ok(Some(WalRecord::Torn));
        }

        self.position += (HEADER_SIZE + data.len()) as u64;

        match WalEntry::decode_data(&header, &data) {
            Ok(entry) => Ok(Some(WalRecord::Entry(entry))),
            Err(TodoError::LogCorruption(reason)) => Ok(Some(WalRecord::Corrupted {
                lsn: header.lsn,
                reason,
            })),
            Err(e) => Err(e),
        }
    }

    /// Read the next valid entry, skipping corrupted records
    ///
    /// Stops (returns `Ok(None)`) at end of file or at a torn tail, and
    /// fails on a record that cannot be framed.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        loop {
            match self.next_record()? {
                Some(WalRecord::Entry(entry)) => return Ok(Some(entry)),
                Some(WalRecord::Corrupted { .. }) => continue,
                Some(WalRecord::Unframed { offset, len }) => {
                    return Err(unframed_error(offset, len));
                }
                Some(WalRecord::Torn) | None => return Ok(None),
            }
        }
    }

    /// Offset just past the last complete record read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over valid WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub(crate) fn unframed_error(offset: u64, len: u32) -> TodoError {
    TodoError::LogCorruption(format!(
        "record at offset {} declares {} bytes (max {}); the rest of the log cannot be framed",
        offset, len, MAX_ENTRY_SIZE
    ))
}

/// Fill `buf` as far as the reader allows; returns the bytes read
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
