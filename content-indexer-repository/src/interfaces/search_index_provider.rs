//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use content_indexer_shared::Document;
use serde_json::Value;

use crate::errors::SearchIndexError;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into `SearchIndexService` and `IndexManager` to
/// enable dependency injection and easy testing with mock implementations.
///
/// # Note on Document Writes
///
/// There is no partial update. Every indexing attempt rebuilds the document and
/// `upsert_document` fully replaces whatever is stored under the same id, so
/// concurrent writes for one item resolve to the last write.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError>;

    /// Create an index with the given settings and mappings body.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was created
    /// * `Err(SearchIndexError::IndexAlreadyExists)` - If another caller created it first
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn create_index(&self, index: &str, body: &Value) -> Result<(), SearchIndexError>;

    /// Delete an index.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was deleted
    /// * `Err(SearchIndexError::IndexNotFound)` - If the index was already gone
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn delete_index(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Retrieve the mapping currently applied to an index.
    async fn get_mapping(&self, index: &str) -> Result<Value, SearchIndexError>;

    /// Store a document, replacing any previous version with the same id.
    async fn upsert_document(&self, index: &str, document: &Document)
        -> Result<(), SearchIndexError>;

    /// Delete a document from an index.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, index: &str, document_id: &str)
        -> Result<(), SearchIndexError>;
}
