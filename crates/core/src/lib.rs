//! Core types and traits for tablecopy
//!
//! This crate defines the foundational types used throughout the system:
//! - AttributeValue: typed attribute values
//! - Item / PrimaryKey: records and their encoded primary keys
//! - Schema types: KeySchema, TableDescription, CreateTableRequest, Tag
//! - Segment / Page / ContinuationToken: segmented scan model
//! - Limits: batch, item and scan size limits, scanner count bounds
//! - Error: error type hierarchy
//! - Traits: collaborator capabilities (TableReader, TableWriter, ...)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod item;
pub mod limits;
pub mod schema;
pub mod segment;
pub mod traits;
pub mod value;

pub use error::{Error, Result};
pub use item::{item_size, key_attributes, Item, PrimaryKey};
pub use limits::{resolve_scanner_count, WriteLimits};
pub use schema::{
    AttributeDefinition, BillingMode, CreateTableRequest, KeySchema, KeySchemaElement, KeyType,
    Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType, SecondaryIndex,
    SseDescription, SseSpecification, SseStatus, SseType, StreamSpecification, StreamViewType,
    TableDescription, TableStatus, Tag, TagPage,
};
pub use segment::{BatchWriteOutcome, ContinuationToken, Page, Segment};
pub use traits::{TableBackend, TableCatalog, TableProvisioner, TableReader, TableWriter, TagLister};
pub use value::AttributeValue;
