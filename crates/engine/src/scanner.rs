//! Segment scanner
//!
//! A `SegmentScanner` drains one segment of the source table into the
//! target: it follows the continuation token chain page by page, feeds
//! every record into a [`WriteBatch`] in read order, and makes a final
//! flush once the segment reports no further pages.
//!
//! Any read or write error ends the scan. The error is returned wrapped in
//! `Error::Segment` so the failing segment is always named. Nothing is
//! retried here; wrap the backend in a [`RetryingWriter`](crate::RetryingWriter)
//! for that.

use crate::batch::WriteBatch;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tablecopy_core::limits::{DEFAULT_PROGRESS_INTERVAL, MAX_BATCH_WRITE_ITEMS};
use tablecopy_core::{ContinuationToken, Error, Result, Segment, TableReader, TableWriter};
use tracing::{debug, info, warn};

/// Per-scanner tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerOptions {
    /// Items per write batch
    pub batch_size: usize,
    /// Records read between progress log lines
    pub progress_interval: u64,
    /// Item limit passed to every scan call
    pub page_limit: Option<usize>,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_WRITE_ITEMS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            page_limit: None,
        }
    }
}

/// Outcome of a fully drained segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentReport {
    /// Segment drained
    pub segment: Segment,
    /// Records read (sum of page sizes)
    pub items: u64,
    /// Scan pages fetched
    pub pages: u64,
    /// Batch write calls made
    pub batches: u64,
    /// Wall time spent on the segment
    pub elapsed: Duration,
}

/// Copies one segment from source to target
pub struct SegmentScanner<B: ?Sized> {
    backend: Arc<B>,
    segment: Segment,
    source: String,
    target: String,
    options: ScannerOptions,
}

impl<B: TableReader + TableWriter + ?Sized> SegmentScanner<B> {
    /// Create a scanner for `segment`
    pub fn new(
        backend: Arc<B>,
        segment: Segment,
        source: impl Into<String>,
        target: impl Into<String>,
        options: ScannerOptions,
    ) -> Self {
        Self {
            backend,
            segment,
            source: source.into(),
            target: target.into(),
            options,
        }
    }

    /// Segment this scanner drains
    pub fn segment(&self) -> Segment {
        self.segment
    }

    /// Drain the segment
    ///
    /// # Errors
    ///
    /// Returns `Error::Segment` wrapping the first read or write failure.
    pub fn run(&self) -> Result<SegmentReport> {
        info!(
            segment = self.segment.index(),
            total = self.segment.total(),
            source = %self.source,
            target = %self.target,
            "scanner started"
        );
        let started = Instant::now();
        let report = self
            .drain(started)
            .map_err(|e| e.in_segment(self.segment.index(), self.segment.total()))?;
        info!(
            segment = self.segment.index(),
            items = report.items,
            pages = report.pages,
            batches = report.batches,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "scanner finished"
        );
        Ok(report)
    }

    fn drain(&self, started: Instant) -> Result<SegmentReport> {
        let backend: &B = &self.backend;
        let mut batch = WriteBatch::new(backend, &self.target, self.options.batch_size);
        let interval = self.options.progress_interval.max(1);

        let mut cursor: Option<ContinuationToken> = None;
        let mut items = 0u64;
        let mut pages = 0u64;

        let result = loop {
            let page = match backend.scan(
                &self.source,
                self.segment,
                cursor.as_ref(),
                self.options.page_limit,
            ) {
                Ok(page) => page,
                Err(e) => break Err(e),
            };
            pages += 1;
            debug!(
                segment = self.segment.index(),
                page = pages,
                items = page.len(),
                last = page.is_last(),
                "page read"
            );

            let next = page.next;
            let mut failed = None;
            for item in page.items {
                items += 1;
                if items % interval == 0 {
                    info!(
                        segment = self.segment.index(),
                        items,
                        target = %self.target,
                        "copy progress"
                    );
                }
                if let Err(e) = batch.put(item) {
                    failed = Some(e);
                    break;
                }
            }
            if let Some(e) = failed {
                break Err(e);
            }

            match next {
                None => break batch.finish().map(|_| ()),
                Some(token) if cursor.as_ref() == Some(&token) => {
                    break Err(Error::Read {
                        table: self.source.clone(),
                        reason: format!(
                            "continuation token did not advance in segment {}",
                            self.segment
                        ),
                    });
                }
                Some(token) => cursor = Some(token),
            }
        };

        if let Err(e) = result {
            let unwritten = batch.unwritten();
            if unwritten > 0 {
                warn!(
                    segment = self.segment.index(),
                    unwritten,
                    target = %self.target,
                    "discarding unwritten items after failure"
                );
            }
            return Err(e);
        }

        Ok(SegmentReport {
            segment: self.segment,
            items,
            pages,
            batches: batch.stats().batches,
            elapsed: started.elapsed(),
        })
    }
}
