//! Table schema and description types
//!
//! These mirror the shape of a table description as reported by the
//! catalog: key schema, attribute definitions, capacity, streams,
//! secondary indexes, server-side encryption and tags. Provisioning reads
//! a source [`TableDescription`] and derives a [`CreateTableRequest`] for
//! the target from it.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role of an attribute in the primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    /// Partition key
    Hash,
    /// Sort key
    Range,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Hash => write!(f, "HASH"),
            KeyType::Range => write!(f, "RANGE"),
        }
    }
}

/// One element of a key schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySchemaElement {
    /// Attribute name
    pub attribute_name: String,
    /// Key role
    pub key_type: KeyType,
}

impl KeySchemaElement {
    /// Create a key schema element
    pub fn new(attribute_name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type,
        }
    }
}

/// Ordered key schema: one HASH element, optionally followed by one RANGE element
///
/// Two schemas are equal only if their elements are equal in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeySchemaElement>", into = "Vec<KeySchemaElement>")]
pub struct KeySchema {
    elements: Vec<KeySchemaElement>,
}

impl KeySchema {
    /// Validate and build a key schema
    pub fn new(elements: Vec<KeySchemaElement>) -> Result<Self> {
        match elements.as_slice() {
            [hash] if hash.key_type == KeyType::Hash => {}
            [hash, range] if hash.key_type == KeyType::Hash && range.key_type == KeyType::Range => {
                if hash.attribute_name == range.attribute_name {
                    return Err(Error::InvalidKeySchema(format!(
                        "attribute '{}' used as both HASH and RANGE",
                        hash.attribute_name
                    )));
                }
            }
            _ => {
                return Err(Error::InvalidKeySchema(
                    "expected one HASH element optionally followed by one RANGE element"
                        .to_string(),
                ))
            }
        }
        Ok(Self { elements })
    }

    /// Key schema with only a partition key
    pub fn hash(name: impl Into<String>) -> Self {
        Self {
            elements: vec![KeySchemaElement::new(name, KeyType::Hash)],
        }
    }

    /// Key schema with a partition key and a sort key
    pub fn hash_range(hash: impl Into<String>, range: impl Into<String>) -> Result<Self> {
        Self::new(vec![
            KeySchemaElement::new(hash, KeyType::Hash),
            KeySchemaElement::new(range, KeyType::Range),
        ])
    }

    /// Partition key attribute name
    pub fn hash_key(&self) -> &str {
        &self.elements[0].attribute_name
    }

    /// Sort key attribute name, if any
    pub fn range_key(&self) -> Option<&str> {
        self.elements.get(1).map(|e| e.attribute_name.as_str())
    }

    /// Elements in key order
    pub fn elements(&self) -> &[KeySchemaElement] {
        &self.elements
    }
}

impl TryFrom<Vec<KeySchemaElement>> for KeySchema {
    type Error = Error;

    fn try_from(elements: Vec<KeySchemaElement>) -> Result<Self> {
        KeySchema::new(elements)
    }
}

impl From<KeySchema> for Vec<KeySchemaElement> {
    fn from(schema: KeySchema) -> Self {
        schema.elements
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", e.attribute_name, e.key_type)?;
        }
        write!(f, "]")
    }
}

/// Scalar type allowed for key attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    /// String
    S,
    /// Number
    N,
    /// Binary
    B,
}

impl fmt::Display for ScalarAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarAttributeType::S => write!(f, "S"),
            ScalarAttributeType::N => write!(f, "N"),
            ScalarAttributeType::B => write!(f, "B"),
        }
    }
}

/// Declared type of a key attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute name
    pub attribute_name: String,
    /// Scalar type
    pub attribute_type: ScalarAttributeType,
}

impl AttributeDefinition {
    /// Create an attribute definition
    pub fn new(attribute_name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            attribute_type,
        }
    }
}

/// Capacity billing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    /// Fixed read/write capacity
    #[default]
    Provisioned,
    /// On-demand capacity
    PayPerRequest,
}

/// Provisioned read/write capacity units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProvisionedThroughput {
    /// Read capacity units
    pub read_capacity_units: u64,
    /// Write capacity units
    pub write_capacity_units: u64,
}

impl ProvisionedThroughput {
    /// True if neither capacity is positive
    pub fn is_unset(&self) -> bool {
        self.read_capacity_units == 0 && self.write_capacity_units == 0
    }
}

/// Change stream view type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamViewType {
    /// Only key attributes
    KeysOnly,
    /// Item after modification
    NewImage,
    /// Item before modification
    OldImage,
    /// Both images
    NewAndOldImages,
}

/// Change stream settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSpecification {
    /// Whether the stream is enabled
    pub stream_enabled: bool,
    /// What each stream record carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<StreamViewType>,
}

/// Attribute projection of a secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    /// All attributes
    #[default]
    All,
    /// Key attributes only
    KeysOnly,
    /// Keys plus listed attributes
    Include,
}

/// Secondary index projection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Projection {
    /// Projection kind
    pub projection_type: ProjectionType,
    /// Extra attributes for `Include`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

/// Global or local secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryIndex {
    /// Index name
    pub index_name: String,
    /// Index key schema
    pub key_schema: KeySchema,
    /// Projected attributes
    #[serde(default)]
    pub projection: Projection,
    /// Index capacity (global indexes on provisioned tables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

/// Server-side encryption status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SseStatus {
    /// Being enabled
    Enabling,
    /// Enabled
    Enabled,
    /// Being disabled
    Disabling,
    /// Disabled
    Disabled,
    /// Key being changed
    Updating,
}

/// Server-side encryption type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SseType {
    /// Service-owned AES-256 key
    Aes256,
    /// Customer-managed key
    Kms,
}

/// Encryption state reported for an existing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseDescription {
    /// Current status
    pub status: SseStatus,
    /// Encryption type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sse_type: Option<SseType>,
    /// Key ARN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_master_key_arn: Option<String>,
}

/// Encryption settings requested on table creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseSpecification {
    /// Whether encryption is enabled
    pub enabled: bool,
    /// Encryption type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sse_type: Option<SseType>,
    /// Key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<String>,
}

impl From<&SseDescription> for SseSpecification {
    fn from(desc: &SseDescription) -> Self {
        Self {
            enabled: desc.status == SseStatus::Enabled,
            sse_type: desc.sse_type,
            kms_master_key_id: desc.kms_master_key_arn.clone(),
        }
    }
}

/// Table lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    /// Being created, not yet writable
    Creating,
    /// Ready for reads and writes
    #[default]
    Active,
    /// Settings being changed
    Updating,
    /// Being deleted
    Deleting,
}

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a tag
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One page of tags from a paginated tag listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPage {
    /// Tags on this page
    pub tags: Vec<Tag>,
    /// Token for the next page; absent on the last page
    pub next_token: Option<String>,
}

/// Full description of an existing table
///
/// Identity fields default when absent so hand-written snapshot files only
/// need a name, key schema and attribute definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Table name
    pub table_name: String,
    /// Resource name, used for tag lookups
    #[serde(default)]
    pub table_arn: String,
    /// Unique id assigned at creation
    #[serde(default = "Uuid::nil")]
    pub table_id: Uuid,
    /// Lifecycle status
    #[serde(default)]
    pub table_status: TableStatus,
    /// Creation time
    #[serde(default)]
    pub creation_date_time: DateTime<Utc>,
    /// Primary key schema
    pub key_schema: KeySchema,
    /// Types of key attributes (table and index keys)
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Billing mode; absent for tables that never reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_mode: Option<BillingMode>,
    /// Provisioned capacity (zero for on-demand tables)
    #[serde(default)]
    pub provisioned_throughput: ProvisionedThroughput,
    /// Change stream settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_specification: Option<StreamSpecification>,
    /// Global secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<SecondaryIndex>,
    /// Local secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<SecondaryIndex>,
    /// Encryption state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sse_description: Option<SseDescription>,
    /// Approximate item count
    #[serde(default)]
    pub item_count: u64,
}

impl TableDescription {
    /// Declared type of an attribute, if defined
    pub fn attribute_type(&self, name: &str) -> Option<ScalarAttributeType> {
        self.attribute_definitions
            .iter()
            .find(|d| d.attribute_name == name)
            .map(|d| d.attribute_type)
    }

    /// True once the table accepts reads and writes
    pub fn is_active(&self) -> bool {
        self.table_status == TableStatus::Active
    }
}

/// Request to create a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    /// Table name
    pub table_name: String,
    /// Primary key schema
    pub key_schema: KeySchema,
    /// Types of key attributes
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Billing mode
    pub billing_mode: BillingMode,
    /// Capacity; only positive values are carried over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    /// Change stream settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_specification: Option<StreamSpecification>,
    /// Global secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<SecondaryIndex>,
    /// Local secondary indexes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<SecondaryIndex>,
    /// Encryption settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sse_specification: Option<SseSpecification>,
    /// Tags applied on creation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CreateTableRequest {
    /// Minimal request: name, key schema and key attribute types
    pub fn new(
        table_name: impl Into<String>,
        key_schema: KeySchema,
        attribute_definitions: Vec<AttributeDefinition>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            key_schema,
            attribute_definitions,
            billing_mode: BillingMode::default(),
            provisioned_throughput: None,
            stream_specification: None,
            global_secondary_indexes: Vec::new(),
            local_secondary_indexes: Vec::new(),
            sse_specification: None,
            tags: Vec::new(),
        }
    }

    /// Set the billing mode
    pub fn with_billing_mode(mut self, billing_mode: BillingMode) -> Self {
        self.billing_mode = billing_mode;
        self
    }

    /// Set provisioned capacity
    pub fn with_throughput(mut self, throughput: ProvisionedThroughput) -> Self {
        self.provisioned_throughput = Some(throughput);
        self
    }

    /// Check that every key attribute (table and indexes) has a definition
    pub fn validate(&self) -> Result<()> {
        let schemas = std::iter::once(&self.key_schema).chain(
            self.global_secondary_indexes
                .iter()
                .chain(&self.local_secondary_indexes)
                .map(|i| &i.key_schema),
        );
        for schema in schemas {
            for element in schema.elements() {
                if !self
                    .attribute_definitions
                    .iter()
                    .any(|d| d.attribute_name == element.attribute_name)
                {
                    return Err(Error::Provisioning {
                        table: self.table_name.clone(),
                        reason: format!(
                            "key attribute '{}' has no attribute definition",
                            element.attribute_name
                        ),
                    });
                }
            }
        }
        for lsi in &self.local_secondary_indexes {
            if lsi.key_schema.hash_key() != self.key_schema.hash_key() {
                return Err(Error::Provisioning {
                    table: self.table_name.clone(),
                    reason: format!(
                        "local index '{}' must share the table partition key",
                        lsi.index_name
                    ),
                });
            }
        }
        Ok(())
    }
}
