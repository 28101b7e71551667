//! Storage layer for tablecopy
//!
//! This crate implements an in-process table backend with:
//! - MemoryStore: DashMap of tables, each a RwLock-guarded BTreeMap
//! - Hash-partitioned segmented scans with opaque continuation tokens
//! - Batch writes enforcing item count, batch size and item size limits
//! - Table creation with CREATING → ACTIVE transition and paginated tags
//! - JSON snapshot load/save
//! - Fault injection for tests (`testing`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod store;
pub mod table;
pub mod testing;

pub use snapshot::{StoreSnapshot, TableSnapshot};
pub use store::{MemoryStore, StoreOptions, ARN_PREFIX};
pub use table::{segment_of, StorageKey, Table};
