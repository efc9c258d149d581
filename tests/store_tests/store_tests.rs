//! Tests for the item stores
//!
//! These tests verify:
//! - The create/get/list/update/delete contract (both stores)
//! - Not-found consistency (no state change)
//! - Partial updates and text validation
//! - Durability across reopen, torn-tail recovery, compaction
//! - Unique ids under concurrent creates

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use todokv::config::{Config, SyncStrategy};
use todokv::{Item, ItemPatch, ItemStore, LogStore, MemoryStore, TodoError};

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryWrite)
        .build()
}

fn setup_log_store() -> (TempDir, LogStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = LogStore::open(config_for(&temp_dir)).unwrap();
    (temp_dir, store)
}

/// Run a contract check against both store implementations
fn for_each_store(check: impl Fn(&dyn ItemStore)) {
    let (_temp, log_store) = setup_log_store();
    check(&log_store);
    check(&MemoryStore::new());
}

/// Like `for_each_store`, for checks that hand the store to threads
fn for_each_shared_store(check: impl Fn(Arc<dyn ItemStore>)) {
    let (_temp, log_store) = setup_log_store();
    check(Arc::new(log_store));
    check(Arc::new(MemoryStore::new()));
}

// =============================================================================
// Contract Tests (both stores)
// =============================================================================

#[test]
fn test_create_assigns_sequential_ids() {
    for_each_store(|store| {
        let first = store.create("Task 1").unwrap();
        let second = store.create("Task 2").unwrap();

        assert_eq!(first, Item { id: 1, done: false, text: "Task 1".into() });
        assert_eq!(second.id, 2);
    });
}

#[test]
fn test_get_returns_created_item() {
    for_each_store(|store| {
        let created = store.create("read me").unwrap();
        assert_eq!(store.get(created.id).unwrap(), created);
    });
}

#[test]
fn test_list_in_creation_order() {
    for_each_store(|store| {
        assert!(store.list().unwrap().is_empty());

        for text in ["Task 1", "Task 2", "Task 3"] {
            store.create(text).unwrap();
        }

        let texts: Vec<String> = store.list().unwrap().into_iter().map(|i| i.text).collect();
        assert_eq!(texts, vec!["Task 1", "Task 2", "Task 3"]);
    });
}

#[test]
fn test_partial_update_keeps_text() {
    for_each_store(|store| {
        let item = store.create("keep me").unwrap();

        let updated = store.update(item.id, &ItemPatch::done(true)).unwrap();

        assert_eq!(updated.text, "keep me");
        assert!(updated.done);
        assert_eq!(store.get(item.id).unwrap(), updated);
    });
}

#[test]
fn test_update_text_keeps_done() {
    for_each_store(|store| {
        let item = store.create("old").unwrap();
        store.update(item.id, &ItemPatch::done(true)).unwrap();

        let updated = store.update(item.id, &ItemPatch::text("new")).unwrap();

        assert_eq!(updated, Item { id: item.id, done: true, text: "new".into() });
    });
}

#[test]
fn test_delete_removes_item() {
    for_each_store(|store| {
        let a = store.create("a").unwrap();
        let b = store.create("b").unwrap();

        store.delete(a.id).unwrap();

        assert!(matches!(store.get(a.id), Err(TodoError::NotFound(id)) if id == a.id));
        assert_eq!(store.list().unwrap(), vec![b]);
    });
}

#[test]
fn test_not_found_is_consistent_and_harmless() {
    for_each_store(|store| {
        let existing = store.create("bystander").unwrap();

        assert!(matches!(store.get(99), Err(TodoError::NotFound(99))));
        assert!(matches!(
            store.update(99, &ItemPatch::text("x")),
            Err(TodoError::NotFound(99))
        ));
        assert!(matches!(store.delete(99), Err(TodoError::NotFound(99))));

        assert_eq!(store.list().unwrap(), vec![existing]);
        // A failed operation does not consume an id
        assert_eq!(store.create("next").unwrap().id, 2);
    });
}

#[test]
fn test_ids_not_reused_after_delete() {
    for_each_store(|store| {
        store.create("a").unwrap();
        let b = store.create("b").unwrap();
        store.delete(b.id).unwrap();

        assert_eq!(store.create("c").unwrap().id, 3);
    });
}

#[test]
fn test_text_validation() {
    for_each_store(|store| {
        assert!(matches!(store.create(""), Err(TodoError::Validation(_))));
        assert!(matches!(
            store.create(&"x".repeat(1025)),
            Err(TodoError::Validation(_))
        ));
        let item = store.create(&"x".repeat(1024)).unwrap();

        assert!(matches!(
            store.update(item.id, &ItemPatch::text("")),
            Err(TodoError::Validation(_))
        ));
        assert_eq!(store.get(item.id).unwrap(), item);
    });
}

// =============================================================================
// Durability Tests
// =============================================================================

#[test]
fn test_items_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = LogStore::open(config_for(&temp_dir)).unwrap();
        store.create("one").unwrap();
        let two = store.create("two").unwrap();
        store.create("three").unwrap();
        store.update(two.id, &ItemPatch::done(true)).unwrap();
        store.delete(1).unwrap();
        store.close().unwrap();
    }

    let store = LogStore::open(config_for(&temp_dir)).unwrap();

    assert_eq!(
        store.list().unwrap(),
        vec![
            Item { id: 2, done: true, text: "two".into() },
            Item { id: 3, done: false, text: "three".into() },
        ]
    );
    assert_eq!(store.create("four").unwrap().id, 4);
}

#[test]
fn test_reopen_without_close() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = LogStore::open(config_for(&temp_dir)).unwrap();
        store.create("written").unwrap();
        // Dropped without close
    }

    let store = LogStore::open(config_for(&temp_dir)).unwrap();
    assert_eq!(store.item_count(), 1);
}

#[test]
fn test_reopen_after_torn_write() {
    let temp_dir = TempDir::new().unwrap();
    let log_path;
    {
        let store = LogStore::open(config_for(&temp_dir)).unwrap();
        store.create("safe").unwrap();
        log_path = store.log_path();
    }
    OpenOptions::new()
        .append(true)
        .open(&log_path)
        .unwrap()
        .write_all(&[7, 0, 0, 0, 0])
        .unwrap();

    let store = LogStore::open(config_for(&temp_dir)).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);

    // The log is usable again after the tail was cut
    store.create("after").unwrap();
    drop(store);
    let store = LogStore::open(config_for(&temp_dir)).unwrap();
    assert_eq!(store.item_count(), 2);
}

#[test]
fn test_open_fails_on_unframeable_record_without_truncating() {
    let temp_dir = TempDir::new().unwrap();
    let log_path;
    {
        let store = LogStore::open(config_for(&temp_dir)).unwrap();
        for text in ["a", "b", "c"] {
            store.create(text).unwrap();
        }
        log_path = store.log_path();
    }

    // Overwrite the length field of the second record
    let mut bytes = std::fs::read(&log_path).unwrap();
    let first_len = 16 + u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as usize;
    bytes[first_len + 12..first_len + 16].copy_from_slice(&u32::MAX.to_le_bytes());
    std::fs::write(&log_path, &bytes).unwrap();

    let result = LogStore::open(config_for(&temp_dir));

    assert!(matches!(result, Err(TodoError::LogCorruption(_))));
    assert_eq!(std::fs::read(&log_path).unwrap(), bytes);
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_keeps_items_and_id_sequence() {
    let (temp_dir, store) = setup_log_store();
    for i in 0..10 {
        store.create(&format!("task {}", i)).unwrap();
    }
    for id in 1..=9 {
        store.delete(id).unwrap();
    }
    assert_eq!(store.log_records(), 19);

    store.compact().unwrap();

    assert_eq!(store.log_records(), 2); // sequence + one live item
    drop(store);

    let store = LogStore::open(config_for(&temp_dir)).unwrap();
    assert_eq!(store.list().unwrap(), vec![Item::new(10, "task 9")]);
    assert_eq!(store.create("eleven").unwrap().id, 11);
}

#[test]
fn test_compact_preserves_deleted_tail_ids() {
    let (temp_dir, store) = setup_log_store();
    store.create("a").unwrap();
    store.create("b").unwrap();
    store.delete(2).unwrap();
    store.compact().unwrap();
    drop(store);

    let store = LogStore::open(config_for(&temp_dir)).unwrap();
    assert_eq!(store.next_id(), 3);
}

#[test]
fn test_open_discards_unfinished_compaction() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = LogStore::open(config_for(&temp_dir)).unwrap();
        store.create("survivor").unwrap();
    }
    let tmp_path = temp_dir.path().join("items.log.compact");
    std::fs::write(&tmp_path, b"interrupted").unwrap();

    let store = LogStore::open(config_for(&temp_dir)).unwrap();

    assert!(!tmp_path.exists());
    assert_eq!(store.list().unwrap(), vec![Item::new(1, "survivor")]);
}

#[test]
fn test_automatic_compaction() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .compaction_threshold(20)
        .build();
    let store = LogStore::open(config.clone()).unwrap();

    let item = store.create("flip").unwrap();
    for i in 0..50 {
        store.update(item.id, &ItemPatch::done(i % 2 == 0)).unwrap();
    }

    assert!(store.log_records() < 20);
    drop(store);

    let store = LogStore::open(config).unwrap();
    assert!(!store.get(item.id).unwrap().done);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_creates_get_unique_ids() {
    let (_temp, store) = setup_log_store();
    let store = Arc::new(store);

    let mut handles = vec![];
    for t in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            (0..25)
                .map(|i| store.create(&format!("thread{}_{}", t, i)).unwrap().id)
                .collect::<Vec<u64>>()
        }));
    }

    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids, (1..=100).collect::<Vec<u64>>());
    assert_eq!(store.item_count(), 100);
}

#[test]
fn test_concurrent_update_and_delete_resolve() {
    for_each_shared_store(|store| {
        for _ in 0..50 {
            let item = store.create("race").unwrap();

            let updater = {
                let store = Arc::clone(&store);
                thread::spawn(move || store.update(item.id, &ItemPatch::done(true)))
            };
            let deleter = {
                let store = Arc::clone(&store);
                thread::spawn(move || store.delete(item.id))
            };

            let update = updater.join().unwrap();
            deleter.join().unwrap().unwrap();

            // Either the update ran first, or it saw the delete
            match update {
                Ok(updated) => assert!(updated.done),
                Err(e) => assert!(matches!(e, TodoError::NotFound(_))),
            }
            assert!(store.get(item.id).is_err());
        }
        assert!(store.list().unwrap().is_empty());
    });
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::EveryNEntries { count: 0 })
        .build();

    assert!(matches!(LogStore::open(config), Err(TodoError::Config(_))));
}
