//! Items and primary keys
//!
//! An [`Item`] is one record: attribute name → [`AttributeValue`]. Its
//! [`PrimaryKey`] is extracted through the table's [`KeySchema`] and
//! encoded into a byte form that stores can order and hash.
//!
//! ## Key Encoding
//!
//! Each key component is written as `type tag (1 byte) | length (u32 BE) | bytes`,
//! partition key first, then the sort key if the schema has one. The
//! encoding is injective, so two items share an encoded key iff they share
//! a primary key.

use crate::error::{Error, Result};
use crate::schema::{KeySchema, ScalarAttributeType};
use crate::value::AttributeValue;
use std::collections::BTreeMap;

/// One record, attribute name → value
pub type Item = BTreeMap<String, AttributeValue>;

/// Stored size of an item: attribute name bytes plus value bytes
pub fn item_size(item: &Item) -> usize {
    item.iter().map(|(k, v)| k.len() + v.size_bytes()).sum()
}

/// Encoded primary key of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey {
    partition: Vec<u8>,
    sort: Option<Vec<u8>>,
}

impl PrimaryKey {
    /// Extract the primary key of `item` under `schema`
    ///
    /// # Errors
    ///
    /// - `MissingKeyAttribute` if a key attribute is absent
    /// - `KeyAttributeType` if a key attribute is not `S`, `N` or `B`
    pub fn from_item(item: &Item, schema: &KeySchema) -> Result<Self> {
        let partition = encode_component(item, schema.hash_key())?;
        let sort = match schema.range_key() {
            Some(name) => Some(encode_component(item, name)?),
            None => None,
        };
        Ok(Self { partition, sort })
    }

    /// Encoded partition key component
    pub fn partition_bytes(&self) -> &[u8] {
        &self.partition
    }

    /// Full encoded key (partition then sort)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.partition.clone();
        if let Some(sort) = &self.sort {
            out.extend_from_slice(sort);
        }
        out
    }
}

/// Extract only the key attributes of an item
pub fn key_attributes(item: &Item, schema: &KeySchema) -> Result<Item> {
    let mut key = Item::new();
    for element in schema.elements() {
        let value = item
            .get(&element.attribute_name)
            .ok_or_else(|| Error::MissingKeyAttribute(element.attribute_name.clone()))?;
        key.insert(element.attribute_name.clone(), value.clone());
    }
    Ok(key)
}

/// Check key attribute types against declared scalar types
pub fn check_key_types(
    item: &Item,
    schema: &KeySchema,
    declared: impl Fn(&str) -> Option<ScalarAttributeType>,
) -> Result<()> {
    for element in schema.elements() {
        let name = &element.attribute_name;
        let value = item
            .get(name)
            .ok_or_else(|| Error::MissingKeyAttribute(name.clone()))?;
        if let Some(expected) = declared(name) {
            if value.scalar_type() != Some(expected) {
                return Err(Error::KeyAttributeType {
                    attribute: name.clone(),
                    expected: expected.to_string(),
                    actual: value.type_name().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn encode_component(item: &Item, name: &str) -> Result<Vec<u8>> {
    let value = item
        .get(name)
        .ok_or_else(|| Error::MissingKeyAttribute(name.to_string()))?;
    let (tag, bytes) = match (value.scalar_type(), value.scalar_bytes()) {
        (Some(ScalarAttributeType::S), Some(b)) => (1u8, b),
        (Some(ScalarAttributeType::N), Some(b)) => (2u8, b),
        (Some(ScalarAttributeType::B), Some(b)) => (3u8, b),
        _ => {
            return Err(Error::KeyAttributeType {
                attribute: name.to_string(),
                expected: "S, N or B".to_string(),
                actual: value.type_name().to_string(),
            })
        }
    };
    let mut out = Vec::with_capacity(5 + bytes.len());
    out.push(tag);
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(out)
}
