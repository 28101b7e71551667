//! Scan segments, pages and continuation tokens
//!
//! A [`Segment`] names one disjoint slice of a table's scan space. Which
//! records fall into which segment is decided by the store; callers only
//! pass `(index, total)` through.

use crate::error::{Error, Result};
use crate::item::Item;
use crate::limits::MAX_TOTAL_SEGMENTS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition descriptor `(index, total)` with `index < total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    index: u32,
    total: u32,
}

impl Segment {
    /// Create a segment descriptor
    ///
    /// # Errors
    ///
    /// `InvalidSegment` unless `0 < total <= MAX_TOTAL_SEGMENTS` and `index < total`.
    pub fn new(index: u32, total: u32) -> Result<Self> {
        if total == 0 || total > MAX_TOTAL_SEGMENTS || index >= total {
            return Err(Error::InvalidSegment { index, total });
        }
        Ok(Self { index, total })
    }

    /// All segments `0..total`
    pub fn all(total: u32) -> Result<Vec<Segment>> {
        (0..total).map(|i| Segment::new(i, total)).collect()
    }

    /// The single segment covering the whole table
    pub fn whole() -> Self {
        Self { index: 0, total: 1 }
    }

    /// Segment index
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Total segment count
    pub fn total(&self) -> u32 {
        self.total
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// Opaque cursor marking where the next page of a segment begins
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Wrap an encoded token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One paginated read result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in read order
    pub items: Vec<Item>,
    /// Cursor for the next page; `None` on the final page
    pub next: Option<ContinuationToken>,
}

impl Page {
    /// Final page of a segment
    pub fn last(items: Vec<Item>) -> Self {
        Self { items, next: None }
    }

    /// Page followed by more data
    pub fn more(items: Vec<Item>, next: ContinuationToken) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }

    /// True if no continuation token was returned
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of one batch write call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchWriteOutcome {
    /// Items the target accepted the batch for but did not apply; the caller resends them
    pub unprocessed: Vec<Item>,
}

impl BatchWriteOutcome {
    /// Every item was applied
    pub fn complete() -> Self {
        Self::default()
    }

    /// True if nothing needs resending
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}
