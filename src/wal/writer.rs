//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! An append either lands completely or not at all: on a write or fsync
//! error the file is cut back to its length before the append. If even
//! that fails the writer refuses further appends until it is reopened.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{Result, TodoError};
use super::{Operation, RecoveryResult, WalEntry};

/// File operations the writer relies on
pub trait LogFile: Write {
    fn sync_data(&self) -> io::Result<()>;
    fn set_len(&self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// Writes entries to the WAL file
pub struct WalWriter<F = File> {
    path: PathBuf,
    file: F,

    /// Bytes in the file (all complete records)
    len: u64,

    /// LSN of the last entry written
    current_lsn: u64,

    sync_strategy: SyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,

    /// Records currently in the file
    records: u64,

    /// Set when the file may no longer match what was acknowledged
    broken: Option<String>,
}

impl WalWriter<File> {
    /// Open or create a WAL file for appending
    ///
    /// `recovered` describes what is already in the file; pass
    /// `RecoveryResult::default()` for a new log. A compaction temp file
    /// left by a crash is removed.
    pub fn open(
        path: &Path,
        sync_strategy: SyncStrategy,
        recovered: &RecoveryResult,
    ) -> Result<Self> {
        let tmp_path = compact_path(path);
        if tmp_path.exists() {
            tracing::warn!("Removing unfinished compaction {}", tmp_path.display());
            fs::remove_file(&tmp_path)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self::from_file(path, file, len, sync_strategy, recovered))
    }

    /// Replace the log contents with `operations`
    ///
    /// The new log is written to a sibling temp file, fsynced, then renamed
    /// over the old one, so a crash leaves either the old or the new log.
    /// LSNs keep increasing across the rewrite.
    pub fn rewrite(&mut self, operations: Vec<Operation>) -> Result<()> {
        self.check_usable()?;
        self.sync()?;

        let tmp_path = compact_path(&self.path);
        let first_lsn = self.current_lsn + 1;
        let records = operations.len() as u64;

        let len = match write_snapshot(&tmp_path, first_lsn, operations) {
            Ok(len) => len,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        // From here on the old file is unlinked; appends must go to the new one
        match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => {
                self.file = file;
                self.len = len;
                self.current_lsn = first_lsn + records - 1;
                self.records = records;
                self.unsynced = 0;
            }
            Err(e) => {
                self.broken = Some(format!("reopen after compaction failed: {}", e));
                return Err(e.into());
            }
        }

        sync_parent_dir(&self.path)
    }
}

impl<F: LogFile> WalWriter<F> {
    /// Wrap an already open log file of `len` bytes
    pub fn from_file(
        path: &Path,
        file: F,
        len: u64,
        sync_strategy: SyncStrategy,
        recovered: &RecoveryResult,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            len,
            current_lsn: recovered.last_lsn,
            sync_strategy,
            unsynced: 0,
            records: recovered.entries_recovered + recovered.entries_corrupted,
            broken: None,
        }
    }

    /// Append an operation to the WAL, returning its LSN
    ///
    /// The entry is written to the OS before returning and fsynced
    /// according to the sync strategy. On error nothing of the entry
    /// remains in the file.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        self.check_usable()?;

        let lsn = self.current_lsn + 1;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        let should_sync = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count.max(1),
        };

        let written = self.file.write_all(&bytes).and_then(|_| {
            if should_sync {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            self.roll_back();
            return Err(TodoError::LogWrite(format!("lsn {}: {}", lsn, e)));
        }

        self.len += bytes.len() as u64;
        self.current_lsn = lsn;
        self.records += 1;
        self.unsynced = if should_sync { 0 } else { self.unsynced + 1 };

        Ok(lsn)
    }

    /// Cut the file back to the last acknowledged record
    fn roll_back(&mut self) {
        let restored = self
            .file
            .set_len(self.len)
            .and_then(|_| self.file.sync_data());

        if let Err(e) = restored {
            tracing::error!(
                "Could not roll back failed append in {}: {}",
                self.path.display(),
                e
            );
            self.broken = Some(format!("rollback of a failed append failed: {}", e));
        }
    }

    fn check_usable(&self) -> Result<()> {
        match &self.broken {
            Some(reason) => Err(TodoError::LogWrite(format!(
                "{} is unusable ({}); reopen the store",
                self.path.display(),
                reason
            ))),
            None => Ok(()),
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Records currently in the file
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Bytes of complete records in the file
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether appends are refused until the log is reopened
    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sibling temp file used while compacting
pub(crate) fn compact_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".compact");
    PathBuf::from(name)
}

/// Write `operations` as a fresh fsynced log, returning its length
fn write_snapshot(path: &Path, first_lsn: u64, operations: Vec<Operation>) -> Result<u64> {
    let mut tmp = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?,
    );

    let mut len = 0u64;
    for (lsn, operation) in (first_lsn..).zip(operations) {
        let bytes = WalEntry::new(lsn, operation).serialize()?;
        tmp.write_all(&bytes)?;
        len += bytes.len() as u64;
    }
    tmp.flush()?;
    tmp.get_ref().sync_all()?;

    Ok(len)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => File::open(dir)?.sync_all()?,
        _ => {}
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
