//! Failures inside scanners reach the caller.

use crate::test_utils::*;
use std::sync::Arc;
use tablecopy::testing::{Fault, FaultyStore};
use tablecopy::{copy_table, CopyConfig, CopyCoordinator, CopyPhase, Error, StoreOptions};

#[test]
fn read_failure_in_one_segment_fails_copy() {
    let store = store_with_source(500, StoreOptions::default());
    create_table(&store, TARGET, false);
    let store = Arc::new(FaultyStore::new(store).fail_read(SOURCE, 1, 1));

    let mut coordinator = CopyCoordinator::new(Arc::clone(&store), config(3));
    let err = coordinator.run(SOURCE, TARGET).unwrap_err();

    assert_eq!(coordinator.phase(), CopyPhase::Failed);
    assert_eq!(err.segment_index(), Some(1));
    assert!(err.to_string().contains("Segment 1/3"));
}

#[test]
fn write_failure_fails_copy_without_rollback() {
    let store = faulty_pair(600);
    let store = Arc::new(
        FaultyStore::from_arc(Arc::clone(&store)).fail_write(TARGET, 3),
    );
    let err = copy_table(Arc::clone(&store), SOURCE, TARGET, config(1)).unwrap_err();

    assert!(matches!(
        err,
        Error::Segment { index: 0, total: 1, ref source } if matches!(**source, Error::Write { .. })
    ));
    // Two batches landed before the failure and stay written
    assert_eq!(store.inner().inner().item_count(TARGET).unwrap(), 50);
}

#[test]
fn stalled_target_fails_copy() {
    let store = faulty_pair(30);
    let store = Arc::new(
        FaultyStore::from_arc(Arc::clone(&store)).with_fault(Fault::RejectAll {
            table: TARGET.to_string(),
        }),
    );
    let err = copy_table(Arc::clone(&store), SOURCE, TARGET, config(1)).unwrap_err();
    assert!(matches!(
        err,
        Error::Segment { ref source, .. } if matches!(**source, Error::UnprocessedItemsStalled { .. })
    ));
}

#[test]
fn retries_absorb_transient_write_failures() {
    let store = faulty_pair(150);
    let store = Arc::new(
        FaultyStore::from_arc(Arc::clone(&store))
            .fail_write(TARGET, 2)
            .fail_write(TARGET, 5),
    );
    let mut cfg = config(1);
    cfg.retry.max_attempts = 2;
    cfg.retry.base_delay_ms = 1;

    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, cfg).unwrap();
    assert_eq!(report.total_items, 150);
    assert_eq!(store.inner().inner().item_count(TARGET).unwrap(), 150);
}

#[test]
fn missing_tables_are_precondition_failures() {
    let store = Arc::new(tablecopy::MemoryStore::new());
    let err = copy_table(Arc::clone(&store), SOURCE, TARGET, CopyConfig::default()).unwrap_err();
    assert!(matches!(err, Error::SourceTableNotFound { .. }));
    assert!(err.is_precondition());

    create_table(&store, SOURCE, false);
    let err = copy_table(Arc::clone(&store), SOURCE, TARGET, CopyConfig::default()).unwrap_err();
    assert!(matches!(err, Error::TargetTableNotFound { .. }));
    assert!(err.is_precondition());
}
