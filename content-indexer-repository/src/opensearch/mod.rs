//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend, plus the schema it applies to new indexes.

mod index_config;
mod provider;

pub use index_config::{analyzer_for_language, is_valid_mapping_hint, IndexSchema, DEFAULT_ANALYZER};
pub use provider::{BasicAuth, OpenSearchProvider};
