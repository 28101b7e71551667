//! Attribute values
//!
//! This module defines [`AttributeValue`], the typed value stored under each
//! attribute name of an item.
//!
//! ## Value Model
//!
//! Ten variants, serialized in the typed-JSON shape used by key-value table
//! exports (`{"S": "hello"}`, `{"N": "42"}`, `{"BOOL": true}` ...):
//! - Scalars: `S` (string), `N` (number as decimal string), `B` (binary)
//! - `BOOL`, `NULL`
//! - Documents: `L` (list), `M` (map)
//! - Sets: `SS`, `NS`, `BS`
//!
//! Binary payloads are base64 encoded on the wire. Only `S`, `N` and `B`
//! may appear in a key attribute.

use crate::schema::ScalarAttributeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// UTF-8 string
    #[serde(rename = "S")]
    S(String),
    /// Number, kept as its decimal string representation
    #[serde(rename = "N")]
    N(String),
    /// Raw bytes
    #[serde(rename = "B")]
    B(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker
    #[serde(rename = "NULL")]
    Null(bool),
    /// Ordered list of values
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    /// Nested map
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeValue>),
    /// String set
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Number set
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// Binary set
    #[serde(rename = "BS")]
    Bs(#[serde(with = "base64_byte_list")] Vec<Vec<u8>>),
}

impl AttributeValue {
    /// Get the type descriptor as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
        }
    }

    /// Scalar type if this value may be used in a key attribute
    pub fn scalar_type(&self) -> Option<ScalarAttributeType> {
        match self {
            AttributeValue::S(_) => Some(ScalarAttributeType::S),
            AttributeValue::N(_) => Some(ScalarAttributeType::N),
            AttributeValue::B(_) => Some(ScalarAttributeType::B),
            _ => None,
        }
    }

    /// Raw bytes of a scalar value, used for key encoding
    pub fn scalar_bytes(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::S(s) | AttributeValue::N(s) => Some(s.as_bytes()),
            AttributeValue::B(b) => Some(b),
            _ => None,
        }
    }

    /// Get as string if this is an `S` value
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Get as number string if this is an `N` value
    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    /// Approximate stored size in bytes
    ///
    /// Numbers count one byte per two significant digits plus one; documents
    /// add three bytes of overhead plus one per element.
    pub fn size_bytes(&self) -> usize {
        match self {
            AttributeValue::S(s) => s.len(),
            AttributeValue::N(n) => number_size(n),
            AttributeValue::B(b) => b.len(),
            AttributeValue::Bool(_) | AttributeValue::Null(_) => 1,
            AttributeValue::L(values) => {
                3 + values.iter().map(|v| v.size_bytes() + 1).sum::<usize>()
            }
            AttributeValue::M(map) => {
                3 + map
                    .iter()
                    .map(|(k, v)| k.len() + v.size_bytes() + 1)
                    .sum::<usize>()
            }
            AttributeValue::Ss(values) => values.iter().map(String::len).sum(),
            AttributeValue::Ns(values) => values.iter().map(|n| number_size(n)).sum(),
            AttributeValue::Bs(values) => values.iter().map(Vec::len).sum(),
        }
    }
}

fn number_size(n: &str) -> usize {
    let digits = n
        .trim_start_matches('-')
        .chars()
        .filter(char::is_ascii_digit)
        .skip_while(|c| *c == '0')
        .count();
    (digits.max(1) + 1) / 2 + 1
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::S(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::N(n.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self {
        AttributeValue::B(b)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod base64_byte_list {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|b| STANDARD.encode(b)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
