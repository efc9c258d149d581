//! Durable store
//!
//! Coordinates the item log and the in-memory table.
//!
//! ## Responsibilities
//! - Append every mutation to the log before applying it to the table
//! - Replay the log on startup (crash recovery)
//! - Compact the log once it grows well past the live data

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, TodoError};
use crate::item::{Item, ItemPatch};
use crate::wal::{Operation, RecoveryResult, WalEntry, WalRecovery, WalWriter};
use super::{patched, validate_text, ItemStore, ItemTable};

/// Log-backed item store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (create/update/delete/compact): serialized by the `wal`
///   mutex. Order inside the lock: validate → log append → table.
///   A failed append leaves the table untouched.
///
/// - **Reads** (get/list): no log lock; the table's RwLock allows many
///   concurrent readers.
pub struct LogStore {
    /// Store configuration
    config: Config,

    /// Item log (exclusive access; doubles as the write lock)
    wal: Mutex<WalWriter>,

    /// Live items
    table: ItemTable,
}

impl LogStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const LOG_FILENAME: &'static str = "items.log";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Replay the item log if it exists (truncating a torn tail)
    /// 3. Open the log for appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        let table = ItemTable::new();

        let recovered = if log_path.exists() {
            let (entries, result) = WalRecovery::recover(&log_path)?;
            for entry in entries {
                Self::replay(&table, entry);
            }

            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    "Log recovery: {} entries recovered, {} corrupted, last_lsn={}, {} items live",
                    result.entries_recovered,
                    result.entries_corrupted,
                    result.last_lsn,
                    table.len()
                );
            }
            result
        } else {
            RecoveryResult::default()
        };

        let wal = WalWriter::open(&log_path, config.sync_strategy, &recovered)?;

        Ok(Self {
            config,
            wal: Mutex::new(wal),
            table,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    fn replay(table: &ItemTable, entry: WalEntry) {
        match entry.operation {
            Operation::Insert(item) | Operation::Update(item) => table.put(item),
            Operation::Delete { id } => {
                table.remove(id);
            }
            Operation::Sequence { next_id } => table.reserve_ids(next_id),
        }
    }

    /// Rewrite the log as a snapshot of the live items
    pub fn compact(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        self.compact_locked(&mut wal)
    }

    /// Compaction body (called with the log lock held)
    fn compact_locked(&self, wal: &mut WalWriter) -> Result<()> {
        let items = self.table.list();
        let live = items.len();

        let mut operations = Vec::with_capacity(live + 1);
        operations.push(Operation::Sequence {
            next_id: self.table.next_id(),
        });
        operations.extend(items.into_iter().map(Operation::Insert));

        let before = wal.records();
        wal.rewrite(operations)?;
        tracing::debug!("Compacted item log: {} records -> {}", before, wal.records());
        Ok(())
    }

    /// Compact when the log has grown past the threshold and is mostly
    /// superseded records
    fn maybe_compact(&self, wal: &mut WalWriter) {
        let threshold = self.config.compaction_threshold;
        if threshold == 0 || wal.records() < threshold {
            return;
        }
        let snapshot_records = self.table.len() as u64 + 1;
        if wal.records() <= snapshot_records * 2 {
            return;
        }

        // The mutation that got us here is already durable; a failed
        // compaction only leaves a longer log behind.
        if let Err(e) = self.compact_locked(wal) {
            tracing::warn!("Log compaction failed: {}", e);
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Path of the item log
    pub fn log_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::LOG_FILENAME)
    }

    /// Number of live items
    pub fn item_count(&self) -> usize {
        self.table.len()
    }

    /// Id the next create will receive
    pub fn next_id(&self) -> u64 {
        self.table.next_id()
    }

    /// Records currently in the item log
    pub fn log_records(&self) -> u64 {
        self.wal.lock().records()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Close the store, syncing the log to disk
    pub fn close(self) -> Result<()> {
        self.wal.lock().sync()
    }
}

impl ItemStore for LogStore {
    fn create(&self, text: &str) -> Result<Item> {
        validate_text(text, self.config.max_text_len)?;

        let mut wal = self.wal.lock();
        let item = Item::new(self.table.next_id(), text);
        wal.append(Operation::Insert(item.clone()))?;
        self.table.put(item.clone());

        self.maybe_compact(&mut wal);
        Ok(item)
    }

    fn get(&self, id: u64) -> Result<Item> {
        self.table.get(id).ok_or(TodoError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<Item>> {
        Ok(self.table.list())
    }

    fn update(&self, id: u64, patch: &ItemPatch) -> Result<Item> {
        let mut wal = self.wal.lock();

        let current = self.table.get(id).ok_or(TodoError::NotFound(id))?;
        let updated = patched(&current, patch, self.config.max_text_len)?;
        wal.append(Operation::Update(updated.clone()))?;
        self.table.put(updated.clone());

        self.maybe_compact(&mut wal);
        Ok(updated)
    }

    fn delete(&self, id: u64) -> Result<()> {
        let mut wal = self.wal.lock();

        if !self.table.contains(id) {
            return Err(TodoError::NotFound(id));
        }
        wal.append(Operation::Delete { id })?;
        self.table.remove(id);

        self.maybe_compact(&mut wal);
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }
}
