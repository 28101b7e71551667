//! Size limits for batches, items and scans
//!
//! The defaults match the limits the batch write and scan primitives of a
//! managed key-value table enforce. Stores may be configured with smaller
//! limits (see [`WriteLimits::with_small_limits`]) for testing.

/// Maximum items in one batch write call
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Maximum total item bytes in one batch write call (16 MiB)
pub const MAX_BATCH_WRITE_BYTES: usize = 16 * 1024 * 1024;

/// Maximum size of a single item (400 KiB)
pub const MAX_ITEM_BYTES: usize = 400 * 1024;

/// Maximum item bytes returned on one scan page (1 MiB)
pub const MAX_SCAN_PAGE_BYTES: usize = 1024 * 1024;

/// Largest accepted `total` for a segmented scan
pub const MAX_TOTAL_SEGMENTS: u32 = 1_000_000;

/// Default number of parallel scanners
pub const DEFAULT_SCANNER_COUNT: u32 = 5;

/// Smallest accepted scanner count
pub const MIN_SCANNER_COUNT: u32 = 1;

/// Largest accepted scanner count
pub const MAX_SCANNER_COUNT: u32 = 20;

/// Records between progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Limits enforced by a batch write primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteLimits {
    /// Maximum items per batch (default: 25)
    pub max_batch_items: usize,

    /// Maximum total item bytes per batch (default: 16 MiB)
    pub max_batch_bytes: usize,

    /// Maximum bytes per item (default: 400 KiB)
    pub max_item_bytes: usize,
}

impl Default for WriteLimits {
    fn default() -> Self {
        WriteLimits {
            max_batch_items: MAX_BATCH_WRITE_ITEMS,
            max_batch_bytes: MAX_BATCH_WRITE_BYTES,
            max_item_bytes: MAX_ITEM_BYTES,
        }
    }
}

impl WriteLimits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        WriteLimits {
            max_batch_items: 4,
            max_batch_bytes: 512,
            max_item_bytes: 256,
        }
    }
}

/// Resolve a requested scanner count
///
/// Values inside `[MIN_SCANNER_COUNT, MAX_SCANNER_COUNT]` are used as-is;
/// anything else falls back to `DEFAULT_SCANNER_COUNT`.
pub fn resolve_scanner_count(requested: u32) -> u32 {
    if (MIN_SCANNER_COUNT..=MAX_SCANNER_COUNT).contains(&requested) {
        requested
    } else {
        DEFAULT_SCANNER_COUNT
    }
}
