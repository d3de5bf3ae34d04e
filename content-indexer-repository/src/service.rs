//! Search index service implementation.
//!
//! This module provides the document-level API used by the pipeline. It
//! validates identifiers before any request reaches the engine.
//!
//! # Note on Document Writes
//!
//! There is no separate `update` function. Every indexing attempt rebuilds the
//! whole document, and `store` replaces the stored version under the same id.

use std::sync::Arc;

use content_indexer_shared::Document;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::utils::{validate_index_name, validate_item_and_site_ids};

/// The main service for writing documents to the search index.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use content_indexer_repository::{OpenSearchProvider, SearchIndexService};
/// use content_indexer_shared::Document;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(OpenSearchProvider::new("http://localhost:9200", None).await?);
/// let service = SearchIndexService::new(provider);
///
/// let mut document = Document::new(42, 1);
/// document.insert("title", "Hello World");
///
/// // Creates the document, or replaces the stored version
/// service.store("cms_content_1", &document).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
}

impl SearchIndexService {
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn SearchIndexProvider> {
        &self.provider
    }

    /// Store a document, replacing any previous version.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was stored
    /// * `Err(SearchIndexError::ValidationError)` - If the index name or document is invalid
    /// * `Err(SearchIndexError)` - If the engine rejects the write
    pub async fn store(&self, index: &str, document: &Document) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        if document.id().is_empty() {
            return Err(SearchIndexError::validation("document id is required"));
        }
        if document.is_empty() {
            return Err(SearchIndexError::validation(format!(
                "document '{}' has no fields",
                document.id()
            )));
        }

        self.provider.upsert_document(index, document).await
    }

    /// Remove the document of `item_id` on `site_id` from `index`.
    ///
    /// Removing a document that does not exist succeeds.
    pub async fn remove(
        &self,
        index: &str,
        item_id: u64,
        site_id: u64,
    ) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        validate_item_and_site_ids(item_id, site_id)?;

        let document_id = Document::document_id(item_id, site_id);
        self.provider.delete_document(index, &document_id).await
    }
}
