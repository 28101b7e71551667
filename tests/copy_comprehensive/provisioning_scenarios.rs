//! Target creation during a copy.

use crate::test_utils::*;
use std::sync::Arc;
use tablecopy::{
    copy_table, CopyConfig, MemoryStore, StoreOptions, TableCatalog, Tag, TagLister,
    WaiterConfig,
};

fn creating_config(verbose: bool) -> CopyConfig {
    CopyConfig {
        create_target: true,
        verbose_copy: verbose,
        waiter: WaiterConfig {
            delay_ms: 1,
            max_attempts: 10,
        },
        ..config(4)
    }
}

#[test]
fn creates_target_then_copies() {
    let store = Arc::new(store_with_source(300, StoreOptions::default()));
    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, creating_config(false)).unwrap();

    assert!(report.target_created);
    assert_eq!(report.total_items, 300);
    let source = store.describe(SOURCE).unwrap();
    let target = store.describe(TARGET).unwrap();
    assert_eq!(target.key_schema, source.key_schema);
    assert!(store.tags_of(&target.table_arn).is_empty());
}

#[test]
fn verbose_copy_carries_tags_and_source_marker() {
    let store = Arc::new(store_with_source(20, StoreOptions::default()));
    let source_arn = MemoryStore::arn_for(SOURCE);
    store.tag_resource(&source_arn, vec![Tag::new("team", "billing")]);

    copy_table(Arc::clone(&store), SOURCE, TARGET, creating_config(true)).unwrap();

    let target_arn = store.describe(TARGET).unwrap().table_arn;
    let tags = store.list_tags(&target_arn, None).unwrap().tags;
    assert_eq!(
        tags,
        vec![
            Tag::new("team", "billing"),
            Tag::new("Source_Table", source_arn),
        ]
    );
}

#[test]
fn waits_for_slow_activation() {
    let store = Arc::new(store_with_source(
        50,
        StoreOptions {
            activation_polls: 3,
            ..StoreOptions::default()
        },
    ));
    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, creating_config(false)).unwrap();
    assert_eq!(report.total_items, 50);
}

#[test]
fn waiter_timeout_aborts_before_scanning() {
    let store = Arc::new(store_with_source(
        50,
        StoreOptions {
            activation_polls: 100,
            ..StoreOptions::default()
        },
    ));
    let err = copy_table(Arc::clone(&store), SOURCE, TARGET, creating_config(false)).unwrap_err();
    assert!(matches!(err, tablecopy::Error::WaiterTimeout { attempts: 10, .. }));
    assert_eq!(store.item_count(TARGET).unwrap(), 0);
}
