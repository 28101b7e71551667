//! JSON snapshot persistence for `MemoryStore`
//!
//! A snapshot file holds every table with its description, tags and items:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "description": {
//!         "table_name": "orders",
//!         "key_schema": [{"attribute_name": "id", "key_type": "HASH"}],
//!         "attribute_definitions": [{"attribute_name": "id", "attribute_type": "S"}]
//!       },
//!       "tags": [{"key": "team", "value": "billing"}],
//!       "items": [{"id": {"S": "o-1"}, "total": {"N": "12.5"}}]
//!     }
//!   ]
//! }
//! ```
//!
//! Identity fields (ARN, id, status, creation time) may be omitted and are
//! filled in on load. Saving writes a temporary file first and renames it
//! over the destination.

use crate::store::{MemoryStore, StoreOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tablecopy_core::{Error, Item, Result, TableDescription, Tag};
use tracing::info;

/// Serialized form of a whole store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Tables in the store
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
}

/// Serialized form of one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table description
    pub description: TableDescription,
    /// Tags on the table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Table items
    #[serde(default)]
    pub items: Vec<Item>,
}

impl MemoryStore {
    /// Build a store from a snapshot
    ///
    /// # Errors
    ///
    /// Fails on duplicate table names or items whose key attributes do not
    /// match the table's key schema.
    pub fn from_snapshot(snapshot: StoreSnapshot, options: StoreOptions) -> Result<Self> {
        let store = MemoryStore::with_options(options);
        for table in snapshot.tables {
            let t = store.insert_table(table.description)?;
            let arn = t.peek_description().table_arn;
            let rows = table
                .items
                .into_iter()
                .map(|item| t.storage_key(&item).map(|key| (key, item)))
                .collect::<Result<Vec<_>>>()?;
            t.put_all(rows);
            if !table.tags.is_empty() {
                store.tag_resource(&arn, table.tags);
            }
        }
        Ok(store)
    }

    /// Capture the full store contents
    pub fn to_snapshot(&self) -> StoreSnapshot {
        let tables = self
            .table_names()
            .into_iter()
            .filter_map(|name| self.table(&name).ok())
            .map(|t| {
                let mut description = t.peek_description();
                description.item_count = t.len() as u64;
                TableSnapshot {
                    tags: self.tags_of(&description.table_arn),
                    items: t.rows(),
                    description,
                }
            })
            .collect();
        StoreSnapshot { tables }
    }

    /// Load a store from a JSON snapshot file
    pub fn load(path: &Path, options: StoreOptions) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content).map_err(|e| {
            Error::Serialization(format!(
                "Failed to parse snapshot '{}': {}",
                path.display(),
                e
            ))
        })?;
        let store = Self::from_snapshot(snapshot, options)?;
        info!(path = %path.display(), tables = store.table_names().len(), "store loaded");
        Ok(store)
    }

    /// Write the store to a JSON snapshot file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(format!("Failed to serialize store: {}", e)))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), "store saved");
        Ok(())
    }
}
