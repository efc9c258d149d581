//! Item definitions
//!
//! The single record type held by the store, and the field set a write
//! request may carry.

use serde::{Deserialize, Serialize};

/// A to-do record
///
/// Field order is the JSON key order: `{"id":..,"done":..,"text":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Assigned by the store on insert, never changes
    pub id: u64,

    /// Completion flag, false on creation
    pub done: bool,

    /// Description
    pub text: String,
}

impl Item {
    /// Create an item as the store does on insert
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            done: false,
            text: text.into(),
        }
    }
}

/// Fields supplied by a create or update request
///
/// `None` means the field was not present in the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub text: Option<String>,
    pub done: Option<bool>,
}

impl ItemPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            done: None,
        }
    }

    pub fn done(done: bool) -> Self {
        Self {
            text: None,
            done: Some(done),
        }
    }

    /// Apply the supplied fields to `item`, leaving the others unchanged
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(text) = &self.text {
            item.text = text.clone();
        }
        if let Some(done) = self.done {
            item.done = done;
        }
    }
}
