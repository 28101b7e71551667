//! Error types for tablecopy
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Variants fall into four groups:
//! - Precondition errors: raised before any segment is scanned
//! - Provisioning errors: target creation and readiness
//! - Segment errors: read/write failures inside one scanner, wrapped in
//!   [`Error::Segment`] so the segment is always named
//! - Ambient errors: configuration, serialization, I/O

use crate::schema::KeySchema;
use std::io;
use thiserror::Error;

/// Result type alias for tablecopy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tablecopy
#[derive(Debug, Error)]
pub enum Error {
    /// Source table does not exist
    #[error("Source table '{table}' does not exist")]
    SourceTableNotFound {
        /// Source table name
        table: String,
    },

    /// Target table does not exist and creation was not requested
    #[error("Target table '{table}' does not exist (pass --create-table to create it)")]
    TargetTableNotFound {
        /// Target table name
        table: String,
    },

    /// Table lookup failed in the catalog
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Source and target key schemas differ
    #[error(
        "Key schemas on source table '{source_table}' ({expected}) and target table '{target_table}' ({found}) are different"
    )]
    KeySchemaMismatch {
        /// Source table name
        source_table: String,
        /// Target table name
        target_table: String,
        /// Key schema of the source table
        expected: KeySchema,
        /// Key schema of the target table
        found: KeySchema,
    },

    /// Table creation requested for a name that already exists
    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    /// Target table creation failed
    #[error("Failed to create table '{table}': {reason}")]
    Provisioning {
        /// Table being created
        table: String,
        /// Failure reason
        reason: String,
    },

    /// Table did not become ACTIVE in time
    #[error("Table '{table}' did not become active after {attempts} attempts")]
    WaiterTimeout {
        /// Table being waited on
        table: String,
        /// Number of describe attempts made
        attempts: u32,
    },

    /// Failure inside one segment scanner
    #[error("Segment {index}/{total} failed: {source}")]
    Segment {
        /// Segment index
        index: u32,
        /// Total segment count
        total: u32,
        /// Underlying read or write failure
        source: Box<Error>,
    },

    /// Scanner worker thread panicked before reporting
    #[error("Scanner worker for segment {index} panicked")]
    WorkerPanicked {
        /// Segment index of the panicked worker
        index: u32,
    },

    /// Paginated read failed
    #[error("Read from table '{table}' failed: {reason}")]
    Read {
        /// Table being read
        table: String,
        /// Failure reason
        reason: String,
    },

    /// Batch write failed
    #[error("Write to table '{table}' failed: {reason}")]
    Write {
        /// Table being written
        table: String,
        /// Failure reason
        reason: String,
    },

    /// Batch exceeds the write primitive's limits
    #[error("Batch too large: {actual} {unit} (max {max})")]
    BatchTooLarge {
        /// Measured size
        actual: usize,
        /// Allowed maximum
        max: usize,
        /// "items" or "bytes"
        unit: &'static str,
    },

    /// Single item exceeds the maximum item size
    #[error("Item too large: {actual} bytes (max {max})")]
    ItemTooLarge {
        /// Item size in bytes
        actual: usize,
        /// Allowed maximum
        max: usize,
    },

    /// Item is missing a key attribute
    #[error("Item is missing key attribute '{0}'")]
    MissingKeyAttribute(String),

    /// Key attribute has a non-scalar or mismatched type
    #[error("Key attribute '{attribute}' has type {actual}, expected {expected}")]
    KeyAttributeType {
        /// Attribute name
        attribute: String,
        /// Declared scalar type
        expected: String,
        /// Actual value type
        actual: String,
    },

    /// Continuation token could not be decoded or belongs to another segment
    #[error("Invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    /// Target kept returning every buffered item as unprocessed
    #[error("Target table '{table}' left {pending} items unprocessed after {rounds} flushes")]
    UnprocessedItemsStalled {
        /// Target table name
        table: String,
        /// Items still buffered
        pending: usize,
        /// Flushes attempted without progress
        rounds: u32,
    },

    /// Invalid segment descriptor
    #[error("Invalid segment {index}/{total}")]
    InvalidSegment {
        /// Segment index
        index: u32,
        /// Total segment count
        total: u32,
    },

    /// Invalid key schema definition
    #[error("Invalid key schema: {0}")]
    InvalidKeySchema(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error (snapshot files, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Wrap a read/write failure with the segment that produced it
    pub fn in_segment(self, index: u32, total: u32) -> Self {
        Error::Segment {
            index,
            total,
            source: Box::new(self),
        }
    }

    /// Segment index if this error came from a scanner
    pub fn segment_index(&self) -> Option<u32> {
        match self {
            Error::Segment { index, .. } | Error::WorkerPanicked { index } => Some(*index),
            _ => None,
        }
    }

    /// True for errors raised before any scanning started
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::SourceTableNotFound { .. }
                | Error::TargetTableNotFound { .. }
                | Error::KeySchemaMismatch { .. }
        )
    }

    /// True for errors worth retrying at the write layer
    pub fn is_retryable_write(&self) -> bool {
        matches!(self, Error::Write { .. })
    }
}
