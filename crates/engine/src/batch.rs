//! Bounded write buffer for one scanner
//!
//! `WriteBatch` accumulates items read from the source and hands them to
//! the target writer in batches that never exceed the configured item
//! capacity or the writer's byte limit.
//!
//! Items the writer reports as unprocessed are put back at the front of
//! the buffer and resent by a later flush. A flush that makes no progress
//! counts towards a stall limit; once [`MAX_STALLED_FLUSHES`] flushes in a
//! row accept nothing, the batch fails with
//! `Error::UnprocessedItemsStalled`.

use std::collections::VecDeque;
use tablecopy_core::{item_size, Error, Item, Result, TableWriter};
use tracing::{debug, warn};

/// Consecutive zero-progress flushes tolerated before failing
pub const MAX_STALLED_FLUSHES: u32 = 8;

/// Counters for one batch buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// `batch_write` calls made
    pub batches: u64,
    /// Items the writer accepted
    pub written: u64,
    /// Items reported unprocessed and re-queued
    pub requeued: u64,
}

/// Buffer of items pending a batch write to one table
pub struct WriteBatch<'a, W: TableWriter + ?Sized> {
    writer: &'a W,
    table: &'a str,
    capacity: usize,
    max_bytes: usize,
    buffer: VecDeque<(usize, Item)>,
    buffered_bytes: usize,
    stalled: u32,
    lost: usize,
    stats: BatchStats,
}

impl<'a, W: TableWriter + ?Sized> WriteBatch<'a, W> {
    /// Create a buffer flushing to `table`
    ///
    /// `capacity` is clamped to `[1, writer.max_batch_items()]`.
    pub fn new(writer: &'a W, table: &'a str, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, writer.max_batch_items().max(1));
        Self {
            writer,
            table,
            capacity,
            max_bytes: writer.max_batch_bytes(),
            buffer: VecDeque::with_capacity(capacity),
            buffered_bytes: 0,
            stalled: 0,
            lost: 0,
            stats: BatchStats::default(),
        }
    }

    /// Items per batch
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items currently buffered
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Items read but never written: buffered plus those in a failed batch
    pub fn unwritten(&self) -> usize {
        self.buffer.len() + self.lost
    }

    /// Counters so far
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Append an item, flushing when the buffer fills
    ///
    /// A flush also happens before the item is added if it would push the
    /// buffered size past the writer's byte limit.
    pub fn put(&mut self, item: Item) -> Result<()> {
        let size = item_size(&item);
        if !self.buffer.is_empty() && self.buffered_bytes + size > self.max_bytes {
            self.flush()?;
        }
        self.buffer.push_back((size, item));
        self.buffered_bytes += size;
        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        Ok(())
    }

    /// Send one batch from the front of the buffer
    ///
    /// Returns the number of items the writer accepted.
    pub fn flush(&mut self) -> Result<usize> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let mut batch = Vec::with_capacity(self.capacity.min(self.buffer.len()));
        let mut batch_bytes = 0usize;
        while let Some((size, _)) = self.buffer.front() {
            if batch.len() == self.capacity
                || (!batch.is_empty() && batch_bytes + size > self.max_bytes)
            {
                break;
            }
            let Some((size, item)) = self.buffer.pop_front() else {
                break;
            };
            batch_bytes += size;
            batch.push(item);
        }
        self.buffered_bytes -= batch_bytes;

        let sent = batch.len();
        self.stats.batches += 1;
        let outcome = match self.writer.batch_write(self.table, batch) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.lost += sent;
                return Err(e);
            }
        };

        let unprocessed = outcome.unprocessed.len();
        let accepted = sent.saturating_sub(unprocessed);
        self.stats.written += accepted as u64;
        debug!(table = self.table, sent, accepted, "batch flushed");

        if unprocessed > 0 {
            self.stats.requeued += unprocessed as u64;
            for item in outcome.unprocessed.into_iter().rev() {
                let size = item_size(&item);
                self.buffered_bytes += size;
                self.buffer.push_front((size, item));
            }
        }

        if accepted == 0 {
            self.stalled += 1;
            warn!(
                table = self.table,
                pending = self.buffer.len(),
                stalled = self.stalled,
                "batch write made no progress"
            );
            if self.stalled >= MAX_STALLED_FLUSHES {
                return Err(Error::UnprocessedItemsStalled {
                    table: self.table.to_string(),
                    pending: self.buffer.len(),
                    rounds: self.stalled,
                });
            }
        } else {
            self.stalled = 0;
        }
        Ok(accepted)
    }

    /// Flush until the buffer is empty
    pub fn finish(&mut self) -> Result<BatchStats> {
        while !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablecopy_core::limits::{MAX_BATCH_WRITE_BYTES, MAX_BATCH_WRITE_ITEMS};
    use tablecopy_core::{AttributeValue, BatchWriteOutcome};
    use parking_lot::Mutex;
    use proptest::prelude::*;

    /// Writer that records batches and can leave items unprocessed
    struct Recorder {
        max_items: usize,
        max_bytes: usize,
        batches: Mutex<Vec<usize>>,
        reject_first: Mutex<usize>,
        reject_all: bool,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                max_items: MAX_BATCH_WRITE_ITEMS,
                max_bytes: MAX_BATCH_WRITE_BYTES,
                batches: Mutex::new(Vec::new()),
                reject_first: Mutex::new(0),
                reject_all: false,
            }
        }
    }

    impl TableWriter for Recorder {
        fn max_batch_items(&self) -> usize {
            self.max_items
        }

        fn max_batch_bytes(&self) -> usize {
            self.max_bytes
        }

        fn batch_write(&self, _table: &str, mut items: Vec<Item>) -> Result<BatchWriteOutcome> {
            assert!(items.len() <= self.max_items);
            self.batches.lock().push(items.len());
            if self.reject_all {
                return Ok(BatchWriteOutcome { unprocessed: items });
            }
            let mut reject = self.reject_first.lock();
            if *reject > 0 && items.len() > 1 {
                *reject -= 1;
                let tail = items.split_off(items.len() - 1);
                return Ok(BatchWriteOutcome { unprocessed: tail });
            }
            Ok(BatchWriteOutcome::complete())
        }
    }

    fn item(i: usize) -> Item {
        let mut item = Item::new();
        item.insert("id".to_string(), AttributeValue::S(format!("k{i}")));
        item
    }

    #[test]
    fn flushes_at_capacity_and_on_finish() {
        let writer = Recorder::new();
        let mut batch = WriteBatch::new(&writer, "t", 25);
        for i in 0..60 {
            batch.put(item(i)).unwrap();
        }
        assert_eq!(batch.len(), 10);
        let stats = batch.finish().unwrap();
        assert_eq!(*writer.batches.lock(), vec![25, 25, 10]);
        assert_eq!(stats.written, 60);
        assert_eq!(stats.batches, 3);
    }

    #[test]
    fn capacity_clamped_to_writer_max() {
        let writer = Recorder {
            max_items: 4,
            ..Recorder::new()
        };
        let batch = WriteBatch::new(&writer, "t", 25);
        assert_eq!(batch.capacity(), 4);
        let batch = WriteBatch::new(&writer, "t", 0);
        assert_eq!(batch.capacity(), 1);
    }

    #[test]
    fn flushes_before_exceeding_byte_limit() {
        let one = item_size(&item(0));
        let writer = Recorder {
            max_bytes: one * 3,
            ..Recorder::new()
        };
        let mut batch = WriteBatch::new(&writer, "t", 25);
        for i in 0..7 {
            batch.put(item(i)).unwrap();
        }
        batch.finish().unwrap();
        assert_eq!(*writer.batches.lock(), vec![3, 3, 1]);
    }

    #[test]
    fn unprocessed_items_are_resent() {
        let writer = Recorder::new();
        *writer.reject_first.lock() = 2;
        let mut batch = WriteBatch::new(&writer, "t", 5);
        for i in 0..10 {
            batch.put(item(i)).unwrap();
        }
        let stats = batch.finish().unwrap();
        assert_eq!(stats.written, 10);
        assert_eq!(stats.requeued, 2);
        assert!(writer.batches.lock().iter().all(|n| *n <= 5));
    }

    #[test]
    fn stalled_target_fails_after_limit() {
        let writer = Recorder {
            reject_all: true,
            ..Recorder::new()
        };
        let mut batch = WriteBatch::new(&writer, "t", 25);
        for i in 0..3 {
            batch.put(item(i)).unwrap();
        }
        let err = batch.finish().unwrap_err();
        assert!(matches!(
            err,
            Error::UnprocessedItemsStalled { pending: 3, rounds: MAX_STALLED_FLUSHES, .. }
        ));
        assert_eq!(writer.batches.lock().len(), MAX_STALLED_FLUSHES as usize);
    }

    #[test]
    fn finish_on_empty_buffer_writes_nothing() {
        let writer = Recorder::new();
        let mut batch = WriteBatch::new(&writer, "t", 25);
        assert_eq!(batch.finish().unwrap(), BatchStats::default());
        assert!(writer.batches.lock().is_empty());
    }

    proptest! {
        #[test]
        fn batches_never_exceed_capacity(capacity in 1usize..40, count in 0usize..300) {
            let writer = Recorder::new();
            let mut batch = WriteBatch::new(&writer, "t", capacity);
            for i in 0..count {
                batch.put(item(i)).unwrap();
            }
            let stats = batch.finish().unwrap();
            let sizes = writer.batches.lock().clone();
            let cap = capacity.min(MAX_BATCH_WRITE_ITEMS);
            prop_assert!(sizes.iter().all(|n| *n >= 1 && *n <= cap));
            prop_assert_eq!(sizes.iter().sum::<usize>(), count);
            prop_assert_eq!(stats.written, count as u64);
        }
    }
}
