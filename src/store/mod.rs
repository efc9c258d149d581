//! Store Module
//!
//! The keyed collection of items behind the HTTP surface.
//!
//! ## Implementations
//! - [`LogStore`]: durable; every mutation is appended to the item log
//!   before it becomes visible, and the log is replayed on open
//! - [`MemoryStore`]: same contract, nothing persisted
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader
//! - Mutations (create/update/delete) are serialized by one lock, and ids
//!   are allocated while holding it
//! - Reads go straight to the [`ItemTable`] read lock

mod table;
mod memory;
mod durable;

pub use table::ItemTable;
pub use memory::MemoryStore;
pub use durable::LogStore;

use crate::error::{Result, TodoError};
use crate::item::{Item, ItemPatch};

/// Create/read/update/delete/list over items keyed by id
pub trait ItemStore: Send + Sync {
    /// Insert a new item with `done = false` and a freshly assigned id
    fn create(&self, text: &str) -> Result<Item>;

    /// Fetch one item
    fn get(&self, id: u64) -> Result<Item>;

    /// All items in insertion order
    fn list(&self) -> Result<Vec<Item>>;

    /// Apply the supplied fields and return the updated item
    fn update(&self, id: u64, patch: &ItemPatch) -> Result<Item>;

    /// Remove an item
    fn delete(&self, id: u64) -> Result<()>;

    /// Make every completed mutation durable
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Reject empty or over-long item text
pub(crate) fn validate_text(text: &str, max_len: usize) -> Result<()> {
    if text.is_empty() {
        return Err(TodoError::Validation(
            "Item text must not be empty".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(TodoError::Validation(format!(
            "Item text is {} characters long (max {})",
            len, max_len
        )));
    }
    Ok(())
}

/// Check a patch against an existing item and produce the updated item
pub(crate) fn patched(current: &Item, patch: &ItemPatch, max_len: usize) -> Result<Item> {
    if let Some(text) = &patch.text {
        validate_text(text, max_len)?;
    }
    let mut updated = current.clone();
    patch.apply_to(&mut updated);
    Ok(updated)
}
