//! Whole-copy scenarios.

use crate::test_utils::*;
use std::sync::Arc;
use tablecopy::{copy_table, CopyCoordinator, CopyPhase, Error, KeySchema, StoreOptions};

#[test]
fn exact_copy_of_2500_records_with_four_scanners() {
    let store = store_with_source(2500, StoreOptions::default());
    create_table(&store, TARGET, false);
    let store = Arc::new(tablecopy::testing::FaultyStore::new(store));

    let report = copy_table(
        Arc::clone(&store),
        SOURCE,
        TARGET,
        tablecopy::CopyConfig {
            batch_size: 25,
            ..config(4)
        },
    )
    .unwrap();

    assert_eq!(report.total_items, 2500);
    assert_eq!(report.segments.len(), 4);
    let inner = store.inner();
    assert_eq!(inner.item_count(TARGET).unwrap(), 2500);
    assert_eq!(inner.items(TARGET).unwrap(), inner.items(SOURCE).unwrap());
    assert!(store.batch_sizes(TARGET).iter().all(|n| *n <= 25));
}

#[test]
fn empty_source_copies_nothing() {
    let store = faulty_pair(0);
    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, config(5)).unwrap();

    assert_eq!(report.total_items, 0);
    assert_eq!(report.segments.len(), 5);
    assert_eq!(store.write_calls(TARGET), 0);
}

#[test]
fn key_schema_mismatch_fails_before_scanning() {
    let store = store_with_source(200, StoreOptions::default());
    create_table(&store, TARGET, true);
    let store = Arc::new(tablecopy::testing::FaultyStore::new(store));

    let mut coordinator = CopyCoordinator::new(Arc::clone(&store), config(4));
    let err = coordinator.run(SOURCE, TARGET).unwrap_err();

    match err {
        Error::KeySchemaMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, KeySchema::hash("id"));
            assert_eq!(found.range_key(), Some("sk"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(coordinator.phase(), CopyPhase::Failed);
    assert_eq!(store.scan_calls(SOURCE), 0);
    assert_eq!(store.inner().item_count(TARGET).unwrap(), 0);
}

#[test]
fn out_of_range_scanner_count_uses_default() {
    for requested in [50, 0] {
        let store = faulty_pair(300);
        let report = copy_table(Arc::clone(&store), SOURCE, TARGET, config(requested)).unwrap();
        assert_eq!(report.segments.len(), 5);
        assert_eq!(report.total_items, 300);
    }
}

#[test]
fn scanner_count_bounds_are_honored() {
    for requested in [1, 20] {
        let store = faulty_pair(150);
        let report = copy_table(Arc::clone(&store), SOURCE, TARGET, config(requested)).unwrap();
        assert_eq!(report.segments.len(), requested as usize);
        assert_eq!(report.total_items, 150);
    }
}

#[test]
fn copy_into_populated_target_overwrites_by_key() {
    let store = store_with_source(100, StoreOptions::default());
    create_table(&store, TARGET, false);
    let mut stale = tablecopy::Item::new();
    stale.insert("id".to_string(), "key-7".into());
    stale.insert("stale".to_string(), true.into());
    store.put_item(TARGET, stale.clone()).unwrap();
    let store = Arc::new(store);

    copy_table(Arc::clone(&store), SOURCE, TARGET, config(3)).unwrap();
    assert_eq!(store.item_count(TARGET).unwrap(), 100);
    let copied = store.get_item(TARGET, &stale).unwrap().unwrap();
    assert!(!copied.contains_key("stale"));
}

#[test]
fn repeated_copy_is_idempotent() {
    let store = faulty_pair(400);
    let first = copy_table(Arc::clone(&store), SOURCE, TARGET, config(4)).unwrap();
    let second = copy_table(Arc::clone(&store), SOURCE, TARGET, config(7)).unwrap();
    assert_eq!(first.total_items, second.total_items);
    assert_eq!(store.inner().item_count(TARGET).unwrap(), 400);
}

#[test]
fn snapshot_round_trip_after_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = store_with_source(250, StoreOptions::default());
    store.save(&path).unwrap();

    let loaded = Arc::new(tablecopy::MemoryStore::load(&path, StoreOptions::default()).unwrap());
    let cfg = tablecopy::CopyConfig {
        create_target: true,
        ..config(4)
    };
    copy_table(Arc::clone(&loaded), SOURCE, TARGET, cfg).unwrap();
    loaded.save(&path).unwrap();

    let reloaded = tablecopy::MemoryStore::load(&path, StoreOptions::default()).unwrap();
    assert_eq!(
        reloaded.items(TARGET).unwrap(),
        reloaded.items(SOURCE).unwrap()
    );
}
