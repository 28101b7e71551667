//! Fault-injecting backend wrapper
//!
//! Faults are matched in insertion order; the first matching fault decides
//! the outcome of a call. Counters are per table (writes) and per
//! (table, segment) (scans), both 1-based.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tablecopy_core::{
    BatchWriteOutcome, ContinuationToken, CreateTableRequest, Error, Item, Page, Result, Segment,
    TableCatalog, TableDescription, TableProvisioner, TableReader, TableWriter, TagLister,
    TagPage,
};

/// Injected fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail the `on_call`-th batch write to `table`
    FailWrite {
        /// Target table
        table: String,
        /// 1-based batch number
        on_call: usize,
    },
    /// Fail scans of `segment` of `table` once `after_pages` pages were served
    FailRead {
        /// Source table
        table: String,
        /// Segment index
        segment: u32,
        /// Pages served before failing
        after_pages: usize,
    },
    /// Report the last `count` items of a batch as unprocessed, `times` times
    PartialWrite {
        /// Target table
        table: String,
        /// Items left unprocessed per batch
        count: usize,
        /// Batches still to affect
        times: usize,
    },
    /// Report every item of every batch to `table` as unprocessed
    RejectAll {
        /// Target table
        table: String,
    },
}

/// Backend wrapper that injects faults and records batch sizes
pub struct FaultyStore<B> {
    inner: Arc<B>,
    faults: Mutex<Vec<Fault>>,
    write_calls: Mutex<FxHashMap<String, usize>>,
    batch_sizes: Mutex<Vec<(String, usize)>>,
    pages_served: Mutex<FxHashMap<(String, u32), usize>>,
}

impl<B> FaultyStore<B> {
    /// Wrap a backend with no faults
    pub fn new(inner: B) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    /// Wrap a shared backend with no faults
    pub fn from_arc(inner: Arc<B>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Vec::new()),
            write_calls: Mutex::new(FxHashMap::default()),
            batch_sizes: Mutex::new(Vec::new()),
            pages_served: Mutex::new(FxHashMap::default()),
        }
    }

    /// Add a fault
    pub fn with_fault(self, fault: Fault) -> Self {
        self.faults.lock().push(fault);
        self
    }

    /// Fail the `on_call`-th batch write to `table`
    pub fn fail_write(self, table: &str, on_call: usize) -> Self {
        self.with_fault(Fault::FailWrite {
            table: table.to_string(),
            on_call,
        })
    }

    /// Fail reads of one segment after `after_pages` pages
    pub fn fail_read(self, table: &str, segment: u32, after_pages: usize) -> Self {
        self.with_fault(Fault::FailRead {
            table: table.to_string(),
            segment,
            after_pages,
        })
    }

    /// Leave `count` items unprocessed in the next `times` batches to `table`
    pub fn partial_writes(self, table: &str, count: usize, times: usize) -> Self {
        self.with_fault(Fault::PartialWrite {
            table: table.to_string(),
            count,
            times,
        })
    }

    /// Wrapped backend
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Sizes of every batch forwarded for `table`, in call order
    pub fn batch_sizes(&self, table: &str) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, n)| *n)
            .collect()
    }

    /// Number of batch write calls made for `table`
    pub fn write_calls(&self, table: &str) -> usize {
        self.write_calls.lock().get(table).copied().unwrap_or(0)
    }

    /// Total scan calls served across all segments of `table`
    pub fn scan_calls(&self, table: &str) -> usize {
        self.pages_served
            .lock()
            .iter()
            .filter(|((t, _), _)| t == table)
            .map(|(_, n)| *n)
            .sum()
    }
}

impl<B: TableReader> TableReader for FaultyStore<B> {
    fn scan(
        &self,
        table: &str,
        segment: Segment,
        start: Option<&ContinuationToken>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let served = {
            let mut pages = self.pages_served.lock();
            let counter = pages
                .entry((table.to_string(), segment.index()))
                .or_insert(0);
            let served = *counter;
            *counter += 1;
            served
        };
        let fails = self.faults.lock().iter().any(|f| {
            matches!(f, Fault::FailRead { table: t, segment: s, after_pages }
                if t == table && *s == segment.index() && served >= *after_pages)
        });
        if fails {
            return Err(Error::Read {
                table: table.to_string(),
                reason: format!("injected read fault on segment {}", segment),
            });
        }
        self.inner.scan(table, segment, start, limit)
    }
}

impl<B: TableWriter> TableWriter for FaultyStore<B> {
    fn max_batch_items(&self) -> usize {
        self.inner.max_batch_items()
    }

    fn max_batch_bytes(&self) -> usize {
        self.inner.max_batch_bytes()
    }

    fn batch_write(&self, table: &str, mut items: Vec<Item>) -> Result<BatchWriteOutcome> {
        let call = {
            let mut calls = self.write_calls.lock();
            let counter = calls.entry(table.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        self.batch_sizes.lock().push((table.to_string(), items.len()));

        let mut unprocessed = Vec::new();
        {
            let mut faults = self.faults.lock();
            for fault in faults.iter_mut() {
                match fault {
                    Fault::FailWrite { table: t, on_call } if t == table && *on_call == call => {
                        return Err(Error::Write {
                            table: table.to_string(),
                            reason: format!("injected write fault on batch {}", call),
                        });
                    }
                    Fault::RejectAll { table: t } if t == table => {
                        return Ok(BatchWriteOutcome { unprocessed: items });
                    }
                    Fault::PartialWrite {
                        table: t,
                        count,
                        times,
                    } if t == table && *times > 0 && !items.is_empty() => {
                        *times -= 1;
                        let keep = items.len().saturating_sub(*count).max(1);
                        unprocessed = items.split_off(keep);
                        break;
                    }
                    _ => {}
                }
            }
        }

        let mut outcome = self.inner.batch_write(table, items)?;
        outcome.unprocessed.extend(unprocessed);
        Ok(outcome)
    }
}

impl<B: TableCatalog> TableCatalog for FaultyStore<B> {
    fn describe(&self, table: &str) -> Result<TableDescription> {
        self.inner.describe(table)
    }
}

impl<B: TableProvisioner> TableProvisioner for FaultyStore<B> {
    fn create_table(&self, request: CreateTableRequest) -> Result<TableDescription> {
        self.inner.create_table(request)
    }
}

impl<B: TagLister> TagLister for FaultyStore<B> {
    fn list_tags(&self, arn: &str, next_token: Option<&str>) -> Result<TagPage> {
        self.inner.list_tags(arn, next_token)
    }
}
