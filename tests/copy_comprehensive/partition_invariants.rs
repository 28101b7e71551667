//! Partitioning and pagination invariants.

use crate::test_utils::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use tablecopy::{
    ContinuationToken, MemoryStore, Segment, StoreOptions, TableReader,
};

/// Drain one segment, returning item ids and the page count
fn drain(store: &MemoryStore, segment: Segment, limit: Option<usize>) -> (Vec<String>, usize) {
    let mut ids = Vec::new();
    let mut cursor: Option<ContinuationToken> = None;
    let mut pages = 0;
    loop {
        let page = store.scan(SOURCE, segment, cursor.as_ref(), limit).unwrap();
        pages += 1;
        ids.extend(
            page.items
                .iter()
                .filter_map(|i| i.get("id").and_then(|v| v.as_s()).map(str::to_string)),
        );
        match page.next {
            Some(next) => {
                assert_ne!(cursor.as_ref(), Some(&next), "token did not advance");
                cursor = Some(next);
            }
            None => break,
        }
        assert!(pages <= 10_000, "pagination did not terminate");
    }
    (ids, pages)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn segments_are_disjoint_and_exhaustive(
        rows in 0usize..400,
        total in 1u32..=20,
        limit in proptest::option::of(1usize..60),
    ) {
        let store = store_with_source(rows, StoreOptions::default());
        let mut seen = BTreeSet::new();
        let mut count = 0;
        for segment in Segment::all(total).unwrap() {
            let (ids, _) = drain(&store, segment, limit);
            count += ids.len();
            seen.extend(ids);
        }
        prop_assert_eq!(count, rows);
        prop_assert_eq!(seen.len(), rows);
    }
}

#[test]
fn pagination_page_count_matches_limit() {
    let store = store_with_source(95, StoreOptions::default());
    let (ids, pages) = drain(&store, Segment::whole(), Some(10));
    assert_eq!(ids.len(), 95);
    assert_eq!(pages, 10);
}

#[test]
fn exact_multiple_of_limit_has_no_trailing_empty_page() {
    let store = store_with_source(40, StoreOptions::default());
    let (ids, pages) = drain(&store, Segment::whole(), Some(10));
    assert_eq!(ids.len(), 40);
    assert_eq!(pages, 4);
}

#[test]
fn foreign_token_is_rejected() {
    let store = store_with_source(200, StoreOptions::default());
    let seg0 = Segment::new(0, 2).unwrap();
    let seg1 = Segment::new(1, 2).unwrap();
    let page = store.scan(SOURCE, seg0, None, Some(5)).unwrap();
    let token = page.next.unwrap();
    assert!(store.scan(SOURCE, seg1, Some(&token), Some(5)).is_err());
}
