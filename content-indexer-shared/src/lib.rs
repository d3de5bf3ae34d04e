//! # Content Indexer Shared
//!
//! This crate defines the data structures shared across the content indexer:
//! the read-only content items handed over by the CMS, their field layouts and
//! raw values, the documents sent to the search engine and the outcome model
//! reported back for every indexing attempt.

pub mod extension;
pub mod types;

pub use extension::{guard, ExtensionError, ExtensionResult};
pub use types::content_item::{ContentItem, ItemAttributes, ItemKind, ItemVariant, SiteInfo};
pub use types::descriptor::IndexableItemDescriptor;
pub use types::document::Document;
pub use types::fields;
pub use types::field_layout::{FieldLayout, FieldNode, FieldType, RelationKind};
pub use types::field_value::{FieldValue, RelatedItem};
pub use types::outcome::{ContentAcquisitionDiagnostic, OutcomeResult, OutcomeStatus};
