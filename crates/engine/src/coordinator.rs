//! Copy coordinator
//!
//! The coordinator owns one whole copy run:
//! - Precondition checks on the source and target tables
//! - Optional creation of the target table
//! - One `SegmentScanner` per segment, each on its own named thread
//! - Aggregation of the per-segment results into one outcome
//!
//! Phases run in order:
//!
//! ```text
//! CheckingSource → CheckingTarget → [CreatingTarget →] Scanning → Aggregating → Done
//!                                                                             ↘ Failed
//! ```
//!
//! Every scanner reports exactly once over an mpsc channel. All threads are
//! joined before results are inspected; the first failure received on the
//! channel is returned. Items already written to the target are kept.

use crate::config::CopyConfig;
use crate::provision::provision_target;
use crate::retry::RetryingWriter;
use crate::scanner::{ScannerOptions, SegmentReport, SegmentScanner};
use crate::waiter::wait_until_active;
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tablecopy_core::{
    Error, Result, Segment, TableBackend, TableDescription, TableReader, TableWriter,
};
use tracing::{debug, error, info, warn};

/// Phase of a copy run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPhase {
    /// Looking up the source table
    CheckingSource,
    /// Looking up the target table and comparing key schemas
    CheckingTarget,
    /// Creating the target table and waiting for it
    CreatingTarget,
    /// Scanners running
    Scanning,
    /// Combining scanner results
    Aggregating,
    /// Copy succeeded
    Done,
    /// Copy failed
    Failed,
}

impl fmt::Display for CopyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyPhase::CheckingSource => "checking-source",
            CopyPhase::CheckingTarget => "checking-target",
            CopyPhase::CreatingTarget => "creating-target",
            CopyPhase::Scanning => "scanning",
            CopyPhase::Aggregating => "aggregating",
            CopyPhase::Done => "done",
            CopyPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a successful copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Source table
    pub source: String,
    /// Target table
    pub target: String,
    /// Records copied across all segments
    pub total_items: u64,
    /// Per-segment reports, sorted by segment index
    pub segments: Vec<SegmentReport>,
    /// Whether the target table was created by this run
    pub target_created: bool,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

/// Runs a parallel segmented copy between two tables of one backend
pub struct CopyCoordinator<B: TableBackend> {
    backend: Arc<B>,
    config: CopyConfig,
    phase: CopyPhase,
}

impl<B: TableBackend> CopyCoordinator<B> {
    /// Create a coordinator
    pub fn new(backend: Arc<B>, config: CopyConfig) -> Self {
        Self {
            backend,
            config,
            phase: CopyPhase::CheckingSource,
        }
    }

    /// Current phase
    pub fn phase(&self) -> CopyPhase {
        self.phase
    }

    /// Copy configuration
    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    fn enter(&mut self, phase: CopyPhase) {
        debug!(from = %self.phase, to = %phase, "copy phase");
        self.phase = phase;
    }

    /// Copy every record of `source` into `target`
    ///
    /// # Errors
    ///
    /// - `SourceTableNotFound` / `TargetTableNotFound` / `KeySchemaMismatch`
    ///   before any scanner starts
    /// - provisioning and waiter errors when the target is created
    /// - the first `Error::Segment` reported by a scanner, or
    ///   `WorkerPanicked`
    pub fn run(&mut self, source: &str, target: &str) -> Result<CopyReport> {
        let started = Instant::now();
        self.phase = CopyPhase::CheckingSource;
        match self.execute(source, target, started) {
            Ok(report) => {
                self.enter(CopyPhase::Done);
                info!(
                    source,
                    target,
                    total_items = report.total_items,
                    segments = report.segments.len(),
                    target_created = report.target_created,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "copy complete"
                );
                Ok(report)
            }
            Err(e) => {
                let failed_in = self.phase;
                self.enter(CopyPhase::Failed);
                error!(source, target, phase = %failed_in, error = %e, "copy failed");
                Err(e)
            }
        }
    }

    fn execute(&mut self, source: &str, target: &str, started: Instant) -> Result<CopyReport> {
        let source_desc = self.check_source(source)?;

        self.enter(CopyPhase::CheckingTarget);
        let target_created = self.check_target(&source_desc, target)?;

        self.enter(CopyPhase::Scanning);
        let total = self.config.effective_scanner_count();
        let options = ScannerOptions {
            batch_size: self
                .config
                .effective_batch_size(self.backend.max_batch_items()),
            progress_interval: self.config.progress_interval,
            page_limit: self.config.scan_page_limit,
        };
        info!(source, target, scanners = total, batch_size = options.batch_size, "copy started");

        let results = if self.config.retry.is_enabled() {
            let writer = Arc::new(RetryingWriter::new(
                Arc::clone(&self.backend),
                self.config.retry.clone(),
            ));
            run_scanners(writer, source, target, total, options)?
        } else {
            run_scanners(Arc::clone(&self.backend), source, target, total, options)?
        };

        self.enter(CopyPhase::Aggregating);
        let segments = aggregate(results)?;
        Ok(CopyReport {
            source: source.to_string(),
            target: target.to_string(),
            total_items: segments.iter().map(|s| s.items).sum(),
            segments,
            target_created,
            elapsed: started.elapsed(),
        })
    }

    fn check_source(&self, source: &str) -> Result<TableDescription> {
        match self.backend.describe(source) {
            Ok(desc) => Ok(desc),
            Err(Error::TableNotFound(_)) => Err(Error::SourceTableNotFound {
                table: source.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Returns whether the target was created
    fn check_target(&mut self, source: &TableDescription, target: &str) -> Result<bool> {
        match self.backend.describe(target) {
            Ok(desc) => {
                if desc.key_schema != source.key_schema {
                    return Err(Error::KeySchemaMismatch {
                        source_table: source.table_name.clone(),
                        target_table: target.to_string(),
                        expected: source.key_schema.clone(),
                        found: desc.key_schema,
                    });
                }
                if !desc.is_active() {
                    wait_until_active(&*self.backend, target, &self.config.waiter)?;
                }
                Ok(false)
            }
            Err(Error::TableNotFound(_)) if self.config.create_target => {
                self.enter(CopyPhase::CreatingTarget);
                provision_target(
                    &*self.backend,
                    source,
                    target,
                    self.config.verbose_copy,
                    &self.config.waiter,
                )?;
                Ok(true)
            }
            Err(Error::TableNotFound(_)) => Err(Error::TargetTableNotFound {
                table: target.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Spawn one scanner thread per segment and join them all
///
/// Returns the results in the order they arrived on the channel, followed
/// by a `WorkerPanicked` entry for every thread that died without
/// reporting.
fn run_scanners<S>(
    backend: Arc<S>,
    source: &str,
    target: &str,
    total: u32,
    options: ScannerOptions,
) -> Result<Vec<Result<SegmentReport>>>
where
    S: TableReader + TableWriter + 'static,
{
    let (tx, rx) = mpsc::channel::<(u32, Result<SegmentReport>)>();
    let mut handles = Vec::with_capacity(total as usize);
    let mut spawn_error = None;

    for segment in Segment::all(total)? {
        let scanner = SegmentScanner::new(Arc::clone(&backend), segment, source, target, options);
        let tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("tablecopy-scan-{}", segment.index()))
            .spawn(move || {
                let result = scanner.run();
                // The receiver outlives every worker
                let _ = tx.send((segment.index(), result));
            });
        match spawned {
            Ok(handle) => handles.push((segment.index(), handle)),
            Err(e) => {
                spawn_error = Some(Error::Io(e));
                break;
            }
        }
    }
    drop(tx);

    let mut panicked = Vec::new();
    for (index, handle) in handles {
        if handle.join().is_err() {
            warn!(segment = index, "scanner thread panicked");
            panicked.push(index);
        }
    }
    if let Some(e) = spawn_error {
        return Err(e);
    }

    let mut results: Vec<Result<SegmentReport>> = rx.iter().map(|(_, result)| result).collect();
    results.extend(
        panicked
            .into_iter()
            .map(|index| Err(Error::WorkerPanicked { index })),
    );
    Ok(results)
}

/// Sum successful segments, or surface the first failure
fn aggregate(results: Vec<Result<SegmentReport>>) -> Result<Vec<SegmentReport>> {
    let mut reports = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => warn!(error = %e, "additional segment failure"),
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    reports.sort_by_key(|r| r.segment.index());
    Ok(reports)
}
