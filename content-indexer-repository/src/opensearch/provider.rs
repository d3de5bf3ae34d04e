//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use content_indexer_shared::Document;
use opensearch::{
    auth::Credentials,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetMappingParts},
    DeleteParts, IndexParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;

const ALREADY_EXISTS_MARKER: &str = "resource_already_exists_exception";

/// Username/password pair for HTTP basic authentication.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// OpenSearch provider implementation.
///
/// Every document write is a full replace through the index API, keyed by the
/// document's deterministic id.
///
/// # Example
///
/// ```ignore
/// let provider = OpenSearchProvider::new("http://localhost:9200", None).await?;
/// provider.create_index("cms_content_1", &schema.to_body()).await?;
/// provider.upsert_document("cms_content_1", &document).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `auth` - Optional basic-auth credentials
    pub async fn new(url: &str, auth: Option<BasicAuth>) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some(auth) = auth {
            builder = builder.auth(Credentials::Basic(auth.username, auth.password));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Verify the cluster answers requests.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }
}

/// Map a failed create-index response to an error.
fn create_failure(index: &str, status: u16, body: &str) -> SearchIndexError {
    if status == 400 && body.contains(ALREADY_EXISTS_MARKER) {
        return SearchIndexError::IndexAlreadyExists(index.to_string());
    }
    SearchIndexError::index_creation(format!(
        "Create index '{}' failed with status {}: {}",
        index, status, body
    ))
}

/// Pull the mapping of `index` out of a get-mapping response body.
fn extract_mapping(index: &str, body: &Value) -> Result<Value, SearchIndexError> {
    body.get(index)
        .and_then(|entry| entry.get("mappings"))
        .cloned()
        .ok_or_else(|| SearchIndexError::parse(format!("No mapping returned for index '{}'", index)))
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchIndexError::unknown(format!(
                "Unexpected status {} checking index '{}'",
                status, index
            ))),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let err = create_failure(index, status.as_u16(), &error_body);
            if !matches!(err, SearchIndexError::IndexAlreadyExists(_)) {
                error!(index = %index, status = %status, body = %error_body, "Create index failed");
            }
            return Err(err);
        }

        info!(index = %index, "Index created");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_deletion(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchIndexError::IndexNotFound(index.to_string()));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %index, status = %status, body = %error_body, "Delete index failed");
            return Err(SearchIndexError::index_deletion(format!(
                "Delete index '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Index deleted");
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::mapping(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Err(SearchIndexError::IndexNotFound(index.to_string()));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::mapping(format!(
                "Get mapping for '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;
        extract_mapping(index, &body)
    }

    async fn upsert_document(
        &self,
        index: &str,
        document: &Document,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, document.id()))
            .body(document.fields())
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %index, status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_id = %document.id(), "Document stored");
        Ok(())
    }

    async fn delete_document(&self, index: &str, document_id: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, document_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document (or its index) may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_id = %document_id, "Document deleted");
        Ok(())
    }
}
