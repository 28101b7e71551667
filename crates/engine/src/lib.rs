//! Copy engine for tablecopy
//!
//! This crate drives a parallel table copy on top of the collaborator
//! traits from `tablecopy-core`:
//! - CopyCoordinator: preconditions, provisioning, scanner threads, aggregation
//! - SegmentScanner: drains one segment page by page into batched writes
//! - WriteBatch: bounded write buffer with re-queue of unprocessed items
//! - Provisioning: target table creation from the source description
//! - RetryingWriter: opt-in exponential backoff for failed batch writes
//! - CopyConfig: `tablecopy.toml` configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod provision;
pub mod retry;
pub mod scanner;
pub mod waiter;

pub use batch::{BatchStats, WriteBatch, MAX_STALLED_FLUSHES};
pub use config::{CopyConfig, RetryConfig, WaiterConfig, CONFIG_FILE_NAME};
pub use coordinator::{CopyCoordinator, CopyPhase, CopyReport};
pub use provision::{build_create_request, collect_tags, provision_target, SOURCE_TABLE_TAG};
pub use retry::RetryingWriter;
pub use scanner::{ScannerOptions, SegmentReport, SegmentScanner};
pub use waiter::wait_until_active;

use std::sync::Arc;
use tablecopy_core::{Result, TableBackend};

/// Copy `source` into `target` with a fresh coordinator
pub fn copy_table<B: TableBackend>(
    backend: Arc<B>,
    source: &str,
    target: &str,
    config: CopyConfig,
) -> Result<CopyReport> {
    CopyCoordinator::new(backend, config).run(source, target)
}
