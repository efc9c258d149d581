//! Tests for ItemTable
//!
//! These tests verify:
//! - Id allocation and ordering
//! - put/remove semantics and next_id tracking
//! - Concurrent readers alongside a writer

use std::sync::Arc;
use std::thread;

use todokv::store::ItemTable;
use todokv::Item;

#[test]
fn test_new_table_is_empty() {
    let table = ItemTable::new();

    assert!(table.is_empty());
    assert_eq!(table.next_id(), 1);
    assert!(table.list().is_empty());
}

#[test]
fn test_insert_new_allocates_ids() {
    let table = ItemTable::new();

    let a = table.insert_new("a");
    let b = table.insert_new("b");

    assert_eq!(a, Item::new(1, "a"));
    assert_eq!(b, Item::new(2, "b"));
    assert_eq!(table.next_id(), 3);
}

#[test]
fn test_put_advances_next_id() {
    let table = ItemTable::new();

    table.put(Item::new(10, "replayed"));

    assert_eq!(table.next_id(), 11);
    assert_eq!(table.insert_new("fresh").id, 11);
}

#[test]
fn test_put_replaces_existing() {
    let table = ItemTable::new();
    let mut item = table.insert_new("draft");
    item.text = "final".to_string();
    item.done = true;

    table.put(item.clone());

    assert_eq!(table.get(item.id), Some(item));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_remove_keeps_next_id() {
    let table = ItemTable::new();
    table.insert_new("a");
    let b = table.insert_new("b");

    assert_eq!(table.remove(b.id), Some(b.clone()));
    assert_eq!(table.remove(b.id), None);
    assert!(!table.contains(b.id));
    assert_eq!(table.next_id(), 3);
}

#[test]
fn test_reserve_ids_never_lowers() {
    let table = ItemTable::new();
    table.reserve_ids(50);
    table.reserve_ids(5);

    assert_eq!(table.next_id(), 50);
}

#[test]
fn test_list_is_id_ordered() {
    let table = ItemTable::new();
    table.put(Item::new(3, "c"));
    table.put(Item::new(1, "a"));
    table.put(Item::new(2, "b"));

    let ids: Vec<u64> = table.list().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_concurrent_readers_with_writer() {
    let table = Arc::new(ItemTable::new());
    for i in 0..100 {
        table.insert_new(&format!("item{}", i));
    }

    let writer = {
        let table = Arc::clone(&table);
        thread::spawn(move || {
            for i in 0..100 {
                table.insert_new(&format!("late{}", i));
            }
        })
    };

    let mut readers = vec![];
    for _ in 0..4 {
        let table = Arc::clone(&table);
        readers.push(thread::spawn(move || {
            for id in 1..=100u64 {
                let item = table.get(id).unwrap();
                assert_eq!(item.text, format!("item{}", id - 1));
            }
        }));
    }

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(table.len(), 200);
}
