//! Batch write retry decorator
//!
//! `RetryingWriter` wraps a backend and retries `Error::Write` failures of
//! `batch_write` with exponential backoff. Limit violations and key errors
//! are never retried. Reads pass straight through.

use crate::config::RetryConfig;
use std::sync::Arc;
use std::thread;
use tablecopy_core::{
    BatchWriteOutcome, ContinuationToken, Item, Page, Result, Segment, TableReader, TableWriter,
};
use tracing::warn;

/// Backend wrapper retrying failed batch writes
pub struct RetryingWriter<B: ?Sized> {
    inner: Arc<B>,
    config: RetryConfig,
}

impl<B: ?Sized> RetryingWriter<B> {
    /// Wrap `inner`
    pub fn new(inner: Arc<B>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Retry settings
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl<B: TableReader + ?Sized> TableReader for RetryingWriter<B> {
    fn scan(
        &self,
        table: &str,
        segment: Segment,
        start: Option<&ContinuationToken>,
        limit: Option<usize>,
    ) -> Result<Page> {
        self.inner.scan(table, segment, start, limit)
    }
}

impl<B: TableWriter + ?Sized> TableWriter for RetryingWriter<B> {
    fn max_batch_items(&self) -> usize {
        self.inner.max_batch_items()
    }

    fn max_batch_bytes(&self) -> usize {
        self.inner.max_batch_bytes()
    }

    fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<BatchWriteOutcome> {
        let mut attempt = 0;
        loop {
            match self.inner.batch_write(table, items.clone()) {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable_write() && attempt < self.config.max_attempts => {
                    let delay = self.config.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        table,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying batch write"
                    );
                    thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
