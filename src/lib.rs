//! tablecopy - parallel segmented copy of one key-value table into another
//!
//! The source table is split into independent scan segments. One scanner
//! per segment pages through its segment and writes every record to the
//! target in bounded batches; the coordinator runs all scanners in
//! parallel and folds their results into a single total or failure.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tablecopy::{copy_table, CopyConfig, MemoryStore, StoreOptions};
//!
//! let store = Arc::new(MemoryStore::load(path, StoreOptions::default())?);
//! let report = copy_table(Arc::clone(&store), "orders", "orders-copy", CopyConfig::default())?;
//! println!("copied {}", report.total_items);
//! ```
//!
//! # Architecture
//!
//! - `tablecopy-core`: values, items, schemas, segments, errors, backend traits
//! - `tablecopy-storage`: `MemoryStore`, an in-process backend with JSON snapshots
//! - `tablecopy-engine`: coordinator, scanners, batching, provisioning, config

pub use tablecopy_core::*;
pub use tablecopy_engine::{
    copy_table, BatchStats, CopyConfig, CopyCoordinator, CopyPhase, CopyReport, RetryConfig,
    RetryingWriter, ScannerOptions, SegmentReport, SegmentScanner, WaiterConfig, WriteBatch,
};
pub use tablecopy_storage::{testing, MemoryStore, StoreOptions, StoreSnapshot, TableSnapshot};
