//! Batch size bound, final flush and aggregate totals.

use crate::test_utils::*;
use std::sync::Arc;
use tablecopy::testing::FaultyStore;
use tablecopy::{copy_table, CopyConfig, StoreOptions, WriteLimits};

#[test]
fn no_batch_exceeds_configured_size() {
    // Page sizes below, at and above the batch capacity, plus unbounded pages
    let page_limits = [Some(1), Some(7), Some(25), Some(26), Some(100), None];
    for batch_size in [1, 7, 25, 100] {
        for scan_page_limit in page_limits {
            let store = faulty_pair(333);
            let cfg = CopyConfig {
                batch_size,
                scan_page_limit,
                ..config(3)
            };
            copy_table(Arc::clone(&store), SOURCE, TARGET, cfg).unwrap();
            let cap = batch_size.min(25);
            let sizes = store.batch_sizes(TARGET);
            assert!(
                sizes.iter().all(|n| *n >= 1 && *n <= cap),
                "batch {batch_size}, page {scan_page_limit:?}: {sizes:?}"
            );
            assert_eq!(sizes.iter().sum::<usize>(), 333);
        }
    }
}

#[test]
fn batches_respect_store_limits() {
    let store = store_with_source(
        120,
        StoreOptions {
            limits: WriteLimits {
                max_batch_items: 4,
                ..WriteLimits::default()
            },
            ..StoreOptions::default()
        },
    );
    create_table(&store, TARGET, false);
    let store = Arc::new(FaultyStore::new(store));

    copy_table(Arc::clone(&store), SOURCE, TARGET, config(2)).unwrap();
    assert!(store.batch_sizes(TARGET).iter().all(|n| *n <= 4));
    assert_eq!(store.inner().item_count(TARGET).unwrap(), 120);
}

#[test]
fn final_partial_batch_is_flushed() {
    // One segment, 60 items: two full batches and one of 10
    let store = faulty_pair(60);
    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, config(1)).unwrap();
    assert_eq!(store.batch_sizes(TARGET), vec![25, 25, 10]);
    assert_eq!(report.segments[0].batches, 3);
    assert_eq!(store.inner().item_count(TARGET).unwrap(), 60);
}

#[test]
fn total_is_sum_of_segment_counts() {
    let store = faulty_pair(777);
    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, config(6)).unwrap();
    let sum: u64 = report.segments.iter().map(|s| s.items).sum();
    assert_eq!(report.total_items, sum);
    assert_eq!(report.total_items, 777);
    let indexes: Vec<u32> = report.segments.iter().map(|s| s.segment.index()).collect();
    assert_eq!(indexes, (0..6).collect::<Vec<_>>());
}

#[test]
fn partial_acceptance_is_resent_until_complete() {
    let store = store_with_source(200, StoreOptions::default());
    create_table(&store, TARGET, false);
    let store = Arc::new(FaultyStore::new(store).partial_writes(TARGET, 5, 10));

    let report = copy_table(Arc::clone(&store), SOURCE, TARGET, config(2)).unwrap();
    assert_eq!(report.total_items, 200);
    assert_eq!(store.inner().item_count(TARGET).unwrap(), 200);
    assert!(store.batch_sizes(TARGET).iter().all(|n| *n <= 25));
}
