//! One stored table: description plus hash-ordered rows
//!
//! # Design
//!
//! - Rows live in a `BTreeMap<StorageKey, Item>` behind a `parking_lot::RwLock`
//! - `StorageKey` orders by (partition hash, encoded primary key)
//! - The 64-bit hash space is split into `total` contiguous ranges, so a
//!   segment is one contiguous key range of the map
//!
//! Segment membership depends only on the partition key, which makes
//! segments disjoint and exhaustive for every `total`.
//!
//! # Continuation Tokens
//!
//! A token is the URL-safe base64 encoding of the last evaluated
//! `StorageKey` (`hash: u64 BE | encoded key`). A token whose hash lies
//! outside the requesting segment is rejected.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU32, Ordering};
use tablecopy_core::item::check_key_types;
use tablecopy_core::limits::MAX_SCAN_PAGE_BYTES;
use tablecopy_core::{
    item_size, ContinuationToken, Error, Item, Page, PrimaryKey, Result, Segment,
    TableDescription, TableStatus,
};
use xxhash_rust::xxh3::xxh3_64;

/// Position of a row in the table's scan order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey {
    hash: u64,
    key: Vec<u8>,
}

impl StorageKey {
    /// Storage key of a primary key
    pub fn from_primary_key(pk: &PrimaryKey) -> Self {
        Self {
            hash: xxh3_64(pk.partition_bytes()),
            key: pk.to_bytes(),
        }
    }

    /// Partition hash
    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn floor(hash: u64) -> Self {
        Self {
            hash,
            key: Vec::new(),
        }
    }

    fn encode_token(&self) -> ContinuationToken {
        let mut raw = Vec::with_capacity(8 + self.key.len());
        raw.extend_from_slice(&self.hash.to_be_bytes());
        raw.extend_from_slice(&self.key);
        ContinuationToken::new(URL_SAFE_NO_PAD.encode(raw))
    }

    fn decode_token(token: &ContinuationToken) -> Result<Self> {
        let raw = URL_SAFE_NO_PAD
            .decode(token.as_str())
            .map_err(|e| Error::InvalidContinuationToken(e.to_string()))?;
        if raw.len() < 8 {
            return Err(Error::InvalidContinuationToken(
                "token shorter than its hash prefix".to_string(),
            ));
        }
        let (hash_bytes, key) = raw.split_at(8);
        let mut buf = [0u8; 8];
        buf.copy_from_slice(hash_bytes);
        Ok(Self {
            hash: u64::from_be_bytes(buf),
            key: key.to_vec(),
        })
    }
}

/// Segment index a partition hash falls into
pub fn segment_of(hash: u64, total: u32) -> u32 {
    ((hash as u128 * total as u128) >> 64) as u32
}

/// Smallest hash belonging to segment `index` of `total`
///
/// Returns `None` past the end of the hash space.
fn segment_start(index: u32, total: u32) -> Option<u64> {
    let numerator = (index as u128) << 64;
    let total = total as u128;
    let start = (numerator + total - 1) / total;
    u64::try_from(start).ok()
}

/// Table state
pub struct Table {
    description: RwLock<TableDescription>,
    rows: RwLock<BTreeMap<StorageKey, Item>>,
    /// Describe calls left before a CREATING table turns ACTIVE
    pending_activation: AtomicU32,
}

impl Table {
    /// Create a table from its description
    ///
    /// A table created in `CREATING` status becomes `ACTIVE` after
    /// `activation_polls` calls to [`Table::describe`].
    pub fn new(description: TableDescription, activation_polls: u32) -> Self {
        Self {
            description: RwLock::new(description),
            rows: RwLock::new(BTreeMap::new()),
            pending_activation: AtomicU32::new(activation_polls),
        }
    }

    /// Current description, advancing CREATING → ACTIVE when due
    pub fn describe(&self) -> TableDescription {
        let mut desc = self.description.write();
        if desc.table_status == TableStatus::Creating {
            let remaining = self.pending_activation.load(Ordering::Acquire);
            if remaining == 0 {
                desc.table_status = TableStatus::Active;
            } else {
                self.pending_activation.store(remaining - 1, Ordering::Release);
            }
        }
        let mut snapshot = desc.clone();
        snapshot.item_count = self.rows.read().len() as u64;
        snapshot
    }

    /// Description without side effects
    pub fn peek_description(&self) -> TableDescription {
        self.description.read().clone()
    }

    /// Lifecycle status without side effects
    pub fn status(&self) -> TableStatus {
        self.description.read().table_status
    }

    /// Table name
    pub fn name(&self) -> String {
        self.description.read().table_name.clone()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// True if no rows are stored
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Validate an item against the key schema and declared key types
    pub fn storage_key(&self, item: &Item) -> Result<StorageKey> {
        let desc = self.description.read();
        check_key_types(item, &desc.key_schema, |name| desc.attribute_type(name))?;
        let pk = PrimaryKey::from_item(item, &desc.key_schema)?;
        Ok(StorageKey::from_primary_key(&pk))
    }

    /// Insert or overwrite rows in one critical section
    pub fn put_all(&self, rows: Vec<(StorageKey, Item)>) {
        let mut map = self.rows.write();
        for (key, item) in rows {
            map.insert(key, item);
        }
    }

    /// Look up the row stored under the primary key of `key_item`
    pub fn get(&self, key_item: &Item) -> Result<Option<Item>> {
        let key = self.storage_key(key_item)?;
        Ok(self.rows.read().get(&key).cloned())
    }

    /// All rows in scan order
    pub fn rows(&self) -> Vec<Item> {
        self.rows.read().values().cloned().collect()
    }

    /// Read one page of `segment`
    ///
    /// The page ends at `limit` items, before the page would exceed
    /// `MAX_SCAN_PAGE_BYTES` (always holding at least one item), or at the
    /// end of the segment. A token is returned iff rows remain.
    pub fn scan(
        &self,
        segment: Segment,
        start: Option<&ContinuationToken>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let lower = match start {
            Some(token) => {
                let key = StorageKey::decode_token(token)?;
                if segment_of(key.hash, segment.total()) != segment.index() {
                    return Err(Error::InvalidContinuationToken(format!(
                        "token does not belong to segment {}",
                        segment
                    )));
                }
                Bound::Excluded(key)
            }
            None => match segment_start(segment.index(), segment.total()) {
                Some(hash) => Bound::Included(StorageKey::floor(hash)),
                None => return Ok(Page::last(Vec::new())),
            },
        };
        let upper = match segment_start(segment.index() + 1, segment.total()) {
            Some(hash) => Bound::Excluded(StorageKey::floor(hash)),
            None => Bound::Unbounded,
        };

        let limit = limit.unwrap_or(usize::MAX).max(1);
        let rows = self.rows.read();
        let mut range = rows.range((lower, upper)).peekable();

        let mut items = Vec::new();
        let mut bytes = 0usize;
        let mut last_key = None;
        while let Some((key, item)) = range.peek() {
            let size = item_size(item);
            if items.len() >= limit || (!items.is_empty() && bytes + size > MAX_SCAN_PAGE_BYTES) {
                break;
            }
            bytes += size;
            items.push((*item).clone());
            last_key = Some(*key);
            range.next();
        }

        let next = match (range.peek(), last_key) {
            (Some(_), Some(key)) => Some(key.encode_token()),
            _ => None,
        };
        Ok(Page { items, next })
    }
}
