//! Volatile store
//!
//! The [`ItemStore`] contract without a log. Contents are lost on drop.

use parking_lot::Mutex;

use crate::config::DEFAULT_MAX_TEXT_LEN;
use crate::error::{Result, TodoError};
use crate::item::{Item, ItemPatch};
use super::{patched, validate_text, ItemStore, ItemTable};

/// In-memory item store
pub struct MemoryStore {
    table: ItemTable,

    /// Serializes read-modify-write sequences
    write_lock: Mutex<()>,

    max_text_len: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_text_len(DEFAULT_MAX_TEXT_LEN)
    }

    pub fn with_max_text_len(max_text_len: usize) -> Self {
        Self {
            table: ItemTable::new(),
            write_lock: Mutex::new(()),
            max_text_len,
        }
    }

    /// Number of live items
    pub fn item_count(&self) -> usize {
        self.table.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore for MemoryStore {
    fn create(&self, text: &str) -> Result<Item> {
        validate_text(text, self.max_text_len)?;
        Ok(self.table.insert_new(text))
    }

    fn get(&self, id: u64) -> Result<Item> {
        self.table.get(id).ok_or(TodoError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<Item>> {
        Ok(self.table.list())
    }

    fn update(&self, id: u64, patch: &ItemPatch) -> Result<Item> {
        let _write_guard = self.write_lock.lock();

        let current = self.table.get(id).ok_or(TodoError::NotFound(id))?;
        let updated = patched(&current, patch, self.max_text_len)?;
        self.table.put(updated.clone());
        Ok(updated)
    }

    fn delete(&self, id: u64) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.table
            .remove(id)
            .map(|_| ())
            .ok_or(TodoError::NotFound(id))
    }
}
