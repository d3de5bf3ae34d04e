//! # Content Indexer Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search engine. It includes definitions for errors, interfaces, index naming
//! and schema generation, index lifecycle management and a concrete
//! implementation for OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod manager;
pub mod opensearch;
pub mod service;
pub mod types;
pub mod utils;

pub use config::{IndexNaming, SchemaConfig};
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use manager::{IndexHook, IndexHooks, IndexManager};
pub use opensearch::{BasicAuth, IndexSchema, OpenSearchProvider};
pub use service::SearchIndexService;
pub use types::{IndexAction, IndexOperation, IndexOperationContext, IndexOperationReport};
pub use utils::{validate_index_name, validate_item_and_site_ids};
