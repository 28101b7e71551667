//! In-process table store
//!
//! `MemoryStore` implements every collaborator trait the copy engine
//! consumes: segmented scans, limit-enforcing batch writes, table
//! description and creation, and paginated tag listing.
//!
//! # Design
//!
//! - DashMap of table name → `Arc<Table>`: lookups never block each other
//! - Each table guards its rows with its own RwLock
//! - Tags are keyed by table ARN, as tag listings are
//!
//! Handles are cheap to share (`Arc<MemoryStore>`); every method may be
//! called concurrently from scanner threads.

use crate::table::{StorageKey, Table};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tablecopy_core::{
    item_size, BatchWriteOutcome, ContinuationToken, CreateTableRequest, Error, Item, Page,
    Result, Segment, SseDescription, SseStatus, TableCatalog, TableDescription, TableProvisioner,
    TableReader, TableStatus, TableWriter, Tag, TagLister, TagPage, WriteLimits,
};
use tracing::debug;
use uuid::Uuid;

/// ARN prefix for tables held by this store
pub const ARN_PREFIX: &str = "arn:tablecopy:local:table/";

/// Store behavior knobs
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Batch write limits
    pub limits: WriteLimits,
    /// Item cap per scan page when the caller passes no limit
    pub default_page_items: Option<usize>,
    /// Tags returned per `list_tags` page
    pub tag_page_size: usize,
    /// Describe calls before a newly created table turns ACTIVE
    pub activation_polls: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            limits: WriteLimits::default(),
            default_page_items: None,
            tag_page_size: 10,
            activation_polls: 0,
        }
    }
}

/// Thread-safe in-memory table store
pub struct MemoryStore {
    tables: DashMap<String, Arc<Table>>,
    tags: DashMap<String, Vec<Tag>>,
    options: StoreOptions,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with default options
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create an empty store
    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            tables: DashMap::new(),
            tags: DashMap::new(),
            options,
        }
    }

    /// Store options
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// ARN of a table name in this store
    pub fn arn_for(table: &str) -> String {
        format!("{}{}", ARN_PREFIX, table)
    }

    pub(crate) fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .get(name)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Register a table from a full description
    ///
    /// Missing identity fields (ARN, id) are filled in.
    pub fn insert_table(&self, mut description: TableDescription) -> Result<Arc<Table>> {
        if description.table_arn.is_empty() {
            description.table_arn = Self::arn_for(&description.table_name);
        }
        if description.table_id.is_nil() {
            description.table_id = Uuid::new_v4();
        }
        let mut polls = 0;
        if description.table_status == TableStatus::Creating {
            polls = self.options.activation_polls;
            if polls == 0 {
                description.table_status = TableStatus::Active;
            }
        }
        let name = description.table_name.clone();
        match self.tables.entry(name.clone()) {
            Entry::Occupied(_) => Err(Error::TableAlreadyExists(name)),
            Entry::Vacant(slot) => {
                let table = Arc::new(Table::new(description, polls));
                slot.insert(Arc::clone(&table));
                Ok(table)
            }
        }
    }

    /// Names of all tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Put a single item, bypassing batch limits
    pub fn put_item(&self, table: &str, item: Item) -> Result<()> {
        let t = self.table(table)?;
        let key = t.storage_key(&item)?;
        t.put_all(vec![(key, item)]);
        Ok(())
    }

    /// Get the item stored under the primary key of `key_item`
    pub fn get_item(&self, table: &str, key_item: &Item) -> Result<Option<Item>> {
        self.table(table)?.get(key_item)
    }

    /// Number of items in a table
    pub fn item_count(&self, table: &str) -> Result<usize> {
        Ok(self.table(table)?.len())
    }

    /// All items of a table in scan order
    pub fn items(&self, table: &str) -> Result<Vec<Item>> {
        Ok(self.table(table)?.rows())
    }

    /// Replace the tags on a resource
    pub fn tag_resource(&self, arn: &str, tags: Vec<Tag>) {
        self.tags.insert(arn.to_string(), tags);
    }

    /// Tags on a resource
    pub fn tags_of(&self, arn: &str) -> Vec<Tag> {
        self.tags
            .get(arn)
            .map(|t| t.value().clone())
            .unwrap_or_default()
    }
}

impl TableReader for MemoryStore {
    fn scan(
        &self,
        table: &str,
        segment: Segment,
        start: Option<&ContinuationToken>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let t = self.table(table)?;
        let page = t.scan(segment, start, limit.or(self.options.default_page_items))?;
        debug!(
            table,
            segment = %segment,
            items = page.len(),
            last = page.is_last(),
            "scan page"
        );
        Ok(page)
    }
}

impl TableWriter for MemoryStore {
    fn max_batch_items(&self) -> usize {
        self.options.limits.max_batch_items
    }

    fn max_batch_bytes(&self) -> usize {
        self.options.limits.max_batch_bytes
    }

    fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<BatchWriteOutcome> {
        let limits = &self.options.limits;
        if items.len() > limits.max_batch_items {
            return Err(Error::BatchTooLarge {
                actual: items.len(),
                max: limits.max_batch_items,
                unit: "items",
            });
        }

        let t = self.table(table)?;
        if t.status() != TableStatus::Active {
            return Err(Error::Write {
                table: table.to_string(),
                reason: "table is not ACTIVE".to_string(),
            });
        }

        let mut total_bytes = 0usize;
        let mut rows = Vec::with_capacity(items.len());
        let mut seen = rustc_hash::FxHashSet::default();
        for item in items {
            let size = item_size(&item);
            if size > limits.max_item_bytes {
                return Err(Error::ItemTooLarge {
                    actual: size,
                    max: limits.max_item_bytes,
                });
            }
            total_bytes += size;
            let key: StorageKey = t.storage_key(&item)?;
            if !seen.insert(key.clone()) {
                return Err(Error::Write {
                    table: table.to_string(),
                    reason: "batch contains duplicate keys".to_string(),
                });
            }
            rows.push((key, item));
        }
        if total_bytes > limits.max_batch_bytes {
            return Err(Error::BatchTooLarge {
                actual: total_bytes,
                max: limits.max_batch_bytes,
                unit: "bytes",
            });
        }

        debug!(table, items = rows.len(), bytes = total_bytes, "batch write");
        t.put_all(rows);
        Ok(BatchWriteOutcome::complete())
    }
}

impl TableCatalog for MemoryStore {
    fn describe(&self, table: &str) -> Result<TableDescription> {
        Ok(self.table(table)?.describe())
    }
}

impl TableProvisioner for MemoryStore {
    fn create_table(&self, request: CreateTableRequest) -> Result<TableDescription> {
        request.validate()?;

        let arn = Self::arn_for(&request.table_name);
        let description = TableDescription {
            table_name: request.table_name.clone(),
            table_arn: arn.clone(),
            table_id: Uuid::new_v4(),
            table_status: TableStatus::Creating,
            creation_date_time: Utc::now(),
            key_schema: request.key_schema,
            attribute_definitions: request.attribute_definitions,
            billing_mode: Some(request.billing_mode),
            provisioned_throughput: request.provisioned_throughput.unwrap_or_default(),
            stream_specification: request.stream_specification,
            global_secondary_indexes: request.global_secondary_indexes,
            local_secondary_indexes: request.local_secondary_indexes,
            sse_description: request.sse_specification.map(|spec| SseDescription {
                status: if spec.enabled {
                    SseStatus::Enabled
                } else {
                    SseStatus::Disabled
                },
                sse_type: spec.sse_type,
                kms_master_key_arn: spec.kms_master_key_id,
            }),
            item_count: 0,
        };

        let table = self.insert_table(description)?;
        if !request.tags.is_empty() {
            self.tag_resource(&arn, request.tags);
        }
        debug!(table = %request.table_name, "table created");
        Ok(table.peek_description())
    }
}

impl TagLister for MemoryStore {
    fn list_tags(&self, arn: &str, next_token: Option<&str>) -> Result<TagPage> {
        let tags = self.tags_of(arn);
        let start = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| Error::Read {
                table: arn.to_string(),
                reason: format!("invalid tag token '{}'", token),
            })?,
            None => 0,
        };
        let page_size = self.options.tag_page_size.max(1);
        let end = (start + page_size).min(tags.len());
        let page = tags.get(start..end).map(<[Tag]>::to_vec).unwrap_or_default();
        let next_token = (end < tags.len()).then(|| end.to_string());
        Ok(TagPage {
            tags: page,
            next_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablecopy_core::{AttributeDefinition, KeySchema, ScalarAttributeType};

    fn store_with_table(name: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_table(CreateTableRequest::new(
                name,
                KeySchema::hash("id"),
                vec![AttributeDefinition::new("id", ScalarAttributeType::S)],
            ))
            .unwrap();
        store
    }

    fn item(id: &str) -> Item {
        let mut item = Item::new();
        item.insert("id".to_string(), id.into());
        item
    }

    #[test]
    fn test_create_then_describe() {
        let store = store_with_table("t");
        let desc = store.describe("t").unwrap();
        assert_eq!(desc.table_status, TableStatus::Active);
        assert_eq!(desc.table_arn, MemoryStore::arn_for("t"));
        assert!(matches!(
            store.describe("missing"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = store_with_table("t");
        let err = store
            .create_table(CreateTableRequest::new(
                "t",
                KeySchema::hash("id"),
                vec![AttributeDefinition::new("id", ScalarAttributeType::S)],
            ))
            .unwrap_err();
        assert!(matches!(err, Error::TableAlreadyExists(_)));
    }

    #[test]
    fn test_batch_write_limits() {
        let store = store_with_table("t");
        let batch: Vec<Item> = (0..26).map(|i| item(&format!("k{i}"))).collect();
        assert!(matches!(
            store.batch_write("t", batch),
            Err(Error::BatchTooLarge { unit: "items", .. })
        ));

        let batch: Vec<Item> = (0..25).map(|i| item(&format!("k{i}"))).collect();
        assert!(store.batch_write("t", batch).unwrap().is_complete());
        assert_eq!(store.item_count("t").unwrap(), 25);
    }

    #[test]
    fn test_batch_write_rejects_duplicates_and_bad_keys() {
        let store = store_with_table("t");
        assert!(store.batch_write("t", vec![item("a"), item("a")]).is_err());

        let mut wrong_type = Item::new();
        wrong_type.insert("id".to_string(), 5i64.into());
        assert!(matches!(
            store.batch_write("t", vec![wrong_type]),
            Err(Error::KeyAttributeType { .. })
        ));
        assert_eq!(store.item_count("t").unwrap(), 0);
    }

    #[test]
    fn test_batch_write_overwrites_by_key() {
        let store = store_with_table("t");
        let mut v1 = item("a");
        v1.insert("v".to_string(), 1i64.into());
        let mut v2 = item("a");
        v2.insert("v".to_string(), 2i64.into());
        store.batch_write("t", vec![v1]).unwrap();
        store.batch_write("t", vec![v2.clone()]).unwrap();
        assert_eq!(store.item_count("t").unwrap(), 1);
        assert_eq!(store.get_item("t", &item("a")).unwrap(), Some(v2));
    }

    #[test]
    fn test_write_to_creating_table_fails() {
        let store = MemoryStore::with_options(StoreOptions {
            activation_polls: 2,
            ..StoreOptions::default()
        });
        store
            .create_table(CreateTableRequest::new(
                "t",
                KeySchema::hash("id"),
                vec![AttributeDefinition::new("id", ScalarAttributeType::S)],
            ))
            .unwrap();
        assert!(matches!(
            store.batch_write("t", vec![item("a")]),
            Err(Error::Write { .. })
        ));
        store.describe("t").unwrap();
        store.describe("t").unwrap();
        assert!(store.describe("t").unwrap().is_active());
        assert!(store.batch_write("t", vec![item("a")]).is_ok());
    }

    #[test]
    fn test_list_tags_paginates() {
        let store = MemoryStore::with_options(StoreOptions {
            tag_page_size: 2,
            ..StoreOptions::default()
        });
        let arn = MemoryStore::arn_for("t");
        store.tag_resource(&arn, (0..5).map(|i| Tag::new(format!("k{i}"), "v")).collect());

        let mut collected = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0;
        loop {
            let page = store.list_tags(&arn, token.as_deref()).unwrap();
            pages += 1;
            collected.extend(page.tags);
            match page.next_token {
                Some(t) => token = Some(t),
                None => break,
            }
        }
        assert_eq!(pages, 3);
        assert_eq!(collected.len(), 5);
        assert_eq!(collected[4].key, "k4");
    }

    #[test]
    fn test_scan_uses_default_page_items() {
        let store = MemoryStore::with_options(StoreOptions {
            default_page_items: Some(3),
            ..StoreOptions::default()
        });
        store
            .create_table(CreateTableRequest::new(
                "t",
                KeySchema::hash("id"),
                vec![AttributeDefinition::new("id", ScalarAttributeType::S)],
            ))
            .unwrap();
        for i in 0..10 {
            store.put_item("t", item(&format!("k{i}"))).unwrap();
        }
        let page = store.scan("t", Segment::whole(), None, None).unwrap();
        assert_eq!(page.len(), 3);
        assert!(!page.is_last());
    }
}
