//! Collaborator traits consumed by the copy engine
//!
//! This module defines the capabilities the engine needs from a table
//! backend, so the scanning core never depends on a concrete store.
//!
//! Thread safety: all traits require `Send + Sync`. One backend handle is
//! shared by every scanner thread; implementations must accept concurrent
//! calls, including concurrent writes to the same table.

use crate::error::Result;
use crate::item::Item;
use crate::schema::{CreateTableRequest, TableDescription, TagPage};
use crate::segment::{BatchWriteOutcome, ContinuationToken, Page, Segment};

/// Paginated, segmented reads from a table
pub trait TableReader: Send + Sync {
    /// Read one page of `segment` of `table`
    ///
    /// Starts at the beginning of the segment when `start` is `None`,
    /// otherwise immediately after the position `start` encodes. `limit`
    /// caps the item count of the page; the store may return fewer.
    ///
    /// The returned page carries a continuation token iff the segment may
    /// have more records.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing, the token is invalid, or
    /// the read fails.
    fn scan(
        &self,
        table: &str,
        segment: Segment,
        start: Option<&ContinuationToken>,
        limit: Option<usize>,
    ) -> Result<Page>;
}

/// Batched writes into a table
pub trait TableWriter: Send + Sync {
    /// Largest item count accepted by one `batch_write`
    fn max_batch_items(&self) -> usize;

    /// Largest total item size accepted by one `batch_write`
    fn max_batch_bytes(&self) -> usize;

    /// Put every item of `items` into `table`
    ///
    /// Items reported back as unprocessed were not applied and must be
    /// resent by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch violates the write limits or the
    /// write fails. Nothing is retried.
    fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<BatchWriteOutcome>;
}

/// Table metadata lookups
pub trait TableCatalog: Send + Sync {
    /// Describe `table`
    ///
    /// # Errors
    ///
    /// `Error::TableNotFound` if no such table exists.
    fn describe(&self, table: &str) -> Result<TableDescription>;
}

/// Table creation
///
/// Readiness is observed through [`TableCatalog::describe`]; a created
/// table may report `CREATING` for a while before it becomes `ACTIVE`.
pub trait TableProvisioner: TableCatalog {
    /// Create a table as described by `request`
    ///
    /// # Errors
    ///
    /// `Error::TableAlreadyExists` if the name is taken, `Error::Provisioning`
    /// for invalid requests.
    fn create_table(&self, request: CreateTableRequest) -> Result<TableDescription>;
}

/// Paginated tag listing
pub trait TagLister: Send + Sync {
    /// List one page of tags on the resource `arn`
    fn list_tags(&self, arn: &str, next_token: Option<&str>) -> Result<TagPage>;
}

/// Everything the copy coordinator needs from one backend
pub trait TableBackend:
    TableReader + TableWriter + TableProvisioner + TagLister + 'static
{
}

impl<T> TableBackend for T where
    T: TableReader + TableWriter + TableProvisioner + TagLister + 'static
{
}
