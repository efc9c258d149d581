//! ItemTable implementation
//!
//! BTreeMap keyed by id, behind a RwLock. Ids are assigned in increasing
//! order, so key order is insertion order.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::item::Item;

#[derive(Debug)]
struct Inner {
    items: BTreeMap<u64, Item>,

    /// Next id to hand out; never decreases
    next_id: u64,
}

/// In-memory table of live items
#[derive(Debug)]
pub struct ItemTable {
    inner: RwLock<Inner>,
}

impl ItemTable {
    /// Create a new empty table; the first id assigned is 1
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Get an item by id (read lock)
    pub fn get(&self, id: u64) -> Option<Item> {
        self.inner.read().items.get(&id).cloned()
    }

    /// Whether an item with this id exists
    pub fn contains(&self, id: u64) -> bool {
        self.inner.read().items.contains_key(&id)
    }

    /// Snapshot of all items in id order
    pub fn list(&self) -> Vec<Item> {
        self.inner.read().items.values().cloned().collect()
    }

    /// Id the next insert will receive
    pub fn next_id(&self) -> u64 {
        self.inner.read().next_id
    }

    /// Allocate an id and insert a new item atomically (write lock)
    pub fn insert_new(&self, text: &str) -> Item {
        let mut inner = self.inner.write();
        let item = Item::new(inner.next_id, text);
        inner.next_id += 1;
        inner.items.insert(item.id, item.clone());
        item
    }

    /// Insert or replace an item (write lock)
    ///
    /// Advances `next_id` past the item's id.
    pub fn put(&self, item: Item) {
        let mut inner = self.inner.write();
        inner.next_id = inner.next_id.max(item.id.saturating_add(1));
        inner.items.insert(item.id, item);
    }

    /// Remove an item (write lock)
    pub fn remove(&self, id: u64) -> Option<Item> {
        self.inner.write().items.remove(&id)
    }

    /// Raise `next_id` to at least `next_id`
    pub fn reserve_ids(&self, next_id: u64) {
        let mut inner = self.inner.write();
        inner.next_id = inner.next_id.max(next_id);
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ItemTable {
    fn default() -> Self {
        Self::new()
    }
}
