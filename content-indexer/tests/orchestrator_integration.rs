//! Integration tests for the content indexer orchestrator.
//!
//! These tests use the real Orchestrator but mock the search engine and the
//! page fetcher, with an in-memory snapshot standing in for the CMS.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use content_indexer::acquisition::{AcquisitionEngine, FetchedPage, PageFetcher};
use content_indexer::assembler::{DocumentAssembler, ExtraFieldRegistry};
use content_indexer::config::IndexerSettings;
use content_indexer::errors::{AcquisitionError, STORAGE_FAILURE_MESSAGE};
use content_indexer::source::{ContentSnapshot, SnapshotContentSource, SnapshotItem};
use content_indexer::{BulkOptions, CancellationFlag, ContentEvent, Orchestrator};
use content_indexer_repository::{
    IndexManager, SearchIndexError, SearchIndexProvider, SearchIndexService,
};
use content_indexer_shared::{
    ContentItem, Document, FieldLayout, FieldType, FieldValue, IndexableItemDescriptor,
    ItemAttributes, ItemKind, ItemVariant, OutcomeStatus, SiteInfo,
};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use url::Url;

const INDEX: &str = "cms_content_1";

#[derive(Default)]
struct ProviderState {
    indexes: BTreeMap<String, Value>,
    documents: BTreeMap<(String, String), Map<String, Value>>,
    calls: Vec<String>,
    fail_upserts: bool,
}

/// Mock SearchIndexProvider recording every call
#[derive(Default)]
struct MockProvider {
    state: Mutex<ProviderState>,
}

impl MockProvider {
    async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    async fn document(&self, index: &str, id: &str) -> Option<Map<String, Value>> {
        self.state
            .lock()
            .await
            .documents
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    async fn upserts(&self) -> usize {
        self.calls()
            .await
            .iter()
            .filter(|call| call.starts_with("upsert"))
            .count()
    }
}

#[async_trait]
impl SearchIndexProvider for MockProvider {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        Ok(self.state.lock().await.indexes.contains_key(index))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("create_index {index}"));
        if state.indexes.contains_key(index) {
            return Err(SearchIndexError::IndexAlreadyExists(index.to_string()));
        }
        state.indexes.insert(index.to_string(), body["mappings"].clone());
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("delete_index {index}"));
        if state.indexes.remove(index).is_none() {
            return Err(SearchIndexError::IndexNotFound(index.to_string()));
        }
        state.documents.retain(|(doc_index, _), _| doc_index != index);
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, SearchIndexError> {
        self.state
            .lock()
            .await
            .indexes
            .get(index)
            .cloned()
            .ok_or_else(|| SearchIndexError::IndexNotFound(index.to_string()))
    }

    async fn upsert_document(
        &self,
        index: &str,
        document: &Document,
    ) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("upsert {index} {}", document.id()));
        if state.fail_upserts {
            return Err(SearchIndexError::index(
                "cluster_block_exception: index [cms_content_1] blocked",
            ));
        }
        state.documents.insert(
            (index.to_string(), document.id().to_string()),
            document.fields().clone(),
        );
        Ok(())
    }

    async fn delete_document(
        &self,
        index: &str,
        document_id: &str,
    ) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("delete {index} {document_id}"));
        state
            .documents
            .remove(&(index.to_string(), document_id.to_string()));
        Ok(())
    }
}

/// Mock PageFetcher answering per URL
#[derive(Default)]
struct MockFetcher {
    responses: HashMap<String, Result<FetchedPage, AcquisitionError>>,
}

impl MockFetcher {
    fn respond(mut self, url: &str, content_type: &str, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Ok(FetchedPage {
                url: Url::parse(url).unwrap(),
                status: 200,
                content_type: Some(content_type.to_string()),
                headers: BTreeMap::new(),
                body: body.to_string(),
                truncated: false,
            }),
        );
        self
    }

    fn fail(mut self, url: &str, err: AcquisitionError) -> Self {
        self.responses.insert(url.to_string(), Err(err));
        self
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, AcquisitionError> {
        self.responses
            .get(url.as_str())
            .cloned()
            .unwrap_or(Err(AcquisitionError::Http(404)))
    }
}

fn entry(id: u64, entry_type: &str, url: Option<&str>) -> ContentItem {
    ContentItem {
        id,
        site_id: 1,
        title: "Hello World".to_string(),
        slug: Some(format!("entry-{id}")),
        status: "live".to_string(),
        url: url.map(str::to_string),
        date_created: Utc::now(),
        date_updated: Utc::now(),
        enabled: true,
        archived: false,
        variant: ItemVariant::Canonical,
        attributes: ItemAttributes::Entry {
            section: "news".to_string(),
            entry_type: entry_type.to_string(),
            post_date: None,
            expiry_date: None,
        },
    }
}

fn pdf_asset(id: u64) -> ContentItem {
    let mut item = entry(id, "", Some("https://example.com/files/brochure.pdf"));
    item.title = "Brochure".to_string();
    item.attributes = ItemAttributes::Asset {
        volume: "documents".to_string(),
        filename: "brochure.pdf".to_string(),
        asset_kind: "pdf".to_string(),
        size: Some(52_000),
        width: None,
        height: None,
    };
    item
}

fn plain(item: ContentItem) -> SnapshotItem {
    SnapshotItem {
        item,
        layout: FieldLayout::new(),
        fields: BTreeMap::new(),
    }
}

fn with_headline(item: ContentItem, headline: &str) -> SnapshotItem {
    let mut layout = FieldLayout::new();
    layout.add_field("headline", FieldType::PlainText, true);
    SnapshotItem {
        item,
        layout,
        fields: BTreeMap::from([(
            "headline".to_string(),
            FieldValue::Text(headline.to_string()),
        )]),
    }
}

struct Harness {
    orchestrator: Orchestrator,
    provider: Arc<MockProvider>,
}

fn harness(settings: IndexerSettings, items: Vec<SnapshotItem>, fetcher: MockFetcher) -> Harness {
    let settings = Arc::new(settings);
    let mut source = SnapshotContentSource::new(ContentSnapshot::default());
    source.add_site(SiteInfo::new(1, "default", "en-US"));
    for item in items {
        source.insert(item);
    }
    let source = Arc::new(source);
    let provider = Arc::new(MockProvider::default());

    let acquisition = AcquisitionEngine::new(settings.clone(), source.clone(), Arc::new(fetcher));
    let assembler = DocumentAssembler::new(ExtraFieldRegistry::new());
    let schema = settings.schema_config(assembler.extra_fields().mapping_hints());
    let indexes = IndexManager::new(provider.clone(), schema);
    let store = SearchIndexService::new(provider.clone());

    Harness {
        orchestrator: Orchestrator::new(settings, source, acquisition, assembler, indexes, store),
        provider,
    }
}

#[tokio::test]
async fn test_live_entry_with_structured_content() {
    let item = entry(1, "article", Some("https://example.com/hello"));
    let h = harness(
        IndexerSettings::default(),
        vec![with_headline(item.clone(), "Hello World")],
        MockFetcher::default(),
    );

    let result = h.orchestrator.index_item(item.descriptor()).await;

    assert_eq!(result.status, OutcomeStatus::Success);
    assert_eq!(result.document_id.as_deref(), Some("1_1"));
    let doc = h.provider.document(INDEX, "1_1").await.unwrap();
    assert_eq!(doc["title"], json!("Hello World"));
    assert!(doc["content"].as_str().unwrap().contains("Hello World"));
}

#[tokio::test]
async fn test_pdf_asset_is_success_without_content() {
    let item = pdf_asset(2);
    let h = harness(
        IndexerSettings::default(),
        vec![plain(item.clone())],
        MockFetcher::default().respond(
            "https://example.com/files/brochure.pdf",
            "application/pdf",
            "%PDF-1.7",
        ),
    );

    let result = h.orchestrator.index_item(item.descriptor()).await;

    assert_eq!(result.status, OutcomeStatus::Success);
    let diagnostic = result.diagnostic.unwrap();
    assert!(diagnostic.attempted);
    assert!(diagnostic.succeeded);
    let doc = h.provider.document(INDEX, "2_1").await.unwrap();
    assert!(!doc.contains_key("content"));
    assert_eq!(doc["kind"], json!("pdf"));
}

#[tokio::test]
async fn test_excluded_entry_type_is_disabled_without_storage() {
    let mut settings = IndexerSettings::default();
    settings.entries.excluded_entry_types = vec!["internalPages".to_string()];
    let item = entry(3, "internalPages", Some("https://example.com/internal"));
    let h = harness(settings, vec![plain(item.clone())], MockFetcher::default());

    let result = h.orchestrator.index_item(item.descriptor()).await;

    assert_eq!(result.status, OutcomeStatus::Disabled);
    assert_eq!(result.message, "Entry type is excluded");
    assert_eq!(h.provider.upserts().await, 0);
}

#[tokio::test]
async fn test_fetch_timeout_is_partial() {
    let url = "https://example.com/slow";
    let item = entry(4, "article", Some(url));
    let h = harness(
        IndexerSettings::default(),
        vec![plain(item.clone())],
        MockFetcher::default().fail(url, AcquisitionError::Timeout),
    );

    let result = h.orchestrator.index_item(item.descriptor()).await;

    assert_eq!(result.status, OutcomeStatus::Partial);
    let diagnostic = result.diagnostic.unwrap();
    assert!(diagnostic.attempted);
    assert!(!diagnostic.succeeded);
    assert_eq!(diagnostic.url.as_deref(), Some(url));
    assert_eq!(diagnostic.error.as_deref(), Some("timeout"));
    let doc = h.provider.document(INDEX, "4_1").await.unwrap();
    assert!(!doc.contains_key("content"));
    assert_eq!(doc["title"], json!("Hello World"));
}

#[tokio::test]
async fn test_missing_item_and_draft_are_skipped() {
    let mut draft = entry(5, "article", Some("https://example.com/draft"));
    draft.variant = ItemVariant::Draft;
    let h = harness(
        IndexerSettings::default(),
        vec![plain(draft.clone())],
        MockFetcher::default(),
    );

    let missing = IndexableItemDescriptor::new(99, 1, ItemKind::Entry);
    let result = h.orchestrator.index_item(missing).await;
    assert_eq!(result.status, OutcomeStatus::Skipped);
    assert_eq!(result.reason, "item_not_found");

    let result = h.orchestrator.index_item(draft.descriptor()).await;
    assert_eq!(result.status, OutcomeStatus::Skipped);
    assert_eq!(result.reason, "draft");
    assert_eq!(h.provider.upserts().await, 0);
}

#[tokio::test]
async fn test_invalid_ids_fail_before_side_effects() {
    let h = harness(IndexerSettings::default(), Vec::new(), MockFetcher::default());

    let result = h
        .orchestrator
        .index_item(IndexableItemDescriptor::new(0, 1, ItemKind::Entry))
        .await;

    assert_eq!(result.status, OutcomeStatus::Failed);
    assert_eq!(result.reason, "validation_failed");
    assert!(h.provider.calls().await.is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_sanitized() {
    let item = entry(6, "article", None);
    let mut settings = IndexerSettings::default();
    settings.require_public_url = false;
    let h = harness(settings, vec![with_headline(item.clone(), "Text")], MockFetcher::default());
    h.provider.state.lock().await.fail_upserts = true;

    let result = h.orchestrator.index_item(item.descriptor()).await;

    assert_eq!(result.status, OutcomeStatus::Failed);
    assert_eq!(result.message, STORAGE_FAILURE_MESSAGE);
    assert!(!result.message.contains("cluster_block_exception"));
}

#[tokio::test]
async fn test_reindexing_twice_is_stable() {
    let item = entry(7, "article", Some("https://example.com/stable"));
    let h = harness(
        IndexerSettings::default(),
        vec![with_headline(item.clone(), "Stable text")],
        MockFetcher::default(),
    );

    let first = h.orchestrator.index_item(item.descriptor()).await;
    let mut first_doc = h.provider.document(INDEX, "7_1").await.unwrap();
    let second = h.orchestrator.index_item(item.descriptor()).await;
    let mut second_doc = h.provider.document(INDEX, "7_1").await.unwrap();

    assert_eq!(first.status, second.status);
    first_doc.remove("indexed_at");
    second_doc.remove("indexed_at");
    assert_eq!(first_doc, second_doc);
}

#[tokio::test]
async fn test_events_remove_stale_documents() {
    let item = entry(8, "article", Some("https://example.com/event"));
    let h = harness(
        IndexerSettings::default(),
        vec![with_headline(item.clone(), "Event text")],
        MockFetcher::default(),
    );

    let result = h.orchestrator.handle_event(ContentEvent::Saved(item.clone())).await;
    assert_eq!(result.status, OutcomeStatus::Success);
    assert!(h.provider.document(INDEX, "8_1").await.is_some());

    let mut disabled = item.clone();
    disabled.status = "expired".to_string();
    let result = h.orchestrator.handle_event(ContentEvent::Saved(disabled)).await;
    assert_eq!(result.status, OutcomeStatus::Skipped);
    assert!(h.provider.document(INDEX, "8_1").await.is_none());

    h.orchestrator.handle_event(ContentEvent::Saved(item.clone())).await;
    let result = h
        .orchestrator
        .handle_event(ContentEvent::Deleted(item.descriptor()))
        .await;
    assert_eq!(result.status, OutcomeStatus::Success);
    assert_eq!(result.reason, "removed");
    assert!(h.provider.document(INDEX, "8_1").await.is_none());
}

#[tokio::test]
async fn test_bulk_reset_recreates_before_indexing() {
    let items = vec![
        with_headline(entry(10, "article", Some("https://example.com/a")), "A"),
        with_headline(entry(11, "article", Some("https://example.com/b")), "B"),
        plain(entry(12, "internalPages", Some("https://example.com/c"))),
        plain(entry(13, "article", None)),
    ];
    let mut settings = IndexerSettings::default();
    settings.entries.excluded_entry_types = vec!["internalPages".to_string()];
    let h = harness(settings, items, MockFetcher::default());
    h.orchestrator.create_index(1).await.unwrap();

    let options = BulkOptions {
        reset: true,
        concurrency: Some(2),
        kinds: None,
    };
    let summary = h
        .orchestrator
        .reindex_site(1, options, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(summary.success, 2);
    assert_eq!(summary.disabled, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.exit_code(), 0);

    let calls = h.provider.calls().await;
    let last_lifecycle = calls
        .iter()
        .rposition(|call| call.contains("_index "))
        .unwrap();
    let first_upsert = calls.iter().position(|call| call.starts_with("upsert")).unwrap();
    assert!(calls[..last_lifecycle].iter().any(|call| call.starts_with("delete_index")));
    assert!(last_lifecycle < first_upsert);
}

#[tokio::test]
async fn test_bulk_cancelled_before_start() {
    let items = vec![
        with_headline(entry(20, "article", Some("https://example.com/a")), "A"),
        with_headline(entry(21, "article", Some("https://example.com/b")), "B"),
    ];
    let h = harness(IndexerSettings::default(), items, MockFetcher::default());
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let summary = h
        .orchestrator
        .reindex_site(1, BulkOptions::default(), &cancel)
        .await
        .unwrap();

    assert_eq!(summary.cancelled, 2);
    assert_eq!(summary.total(), 2);
    assert_eq!(h.provider.upserts().await, 0);
}

#[tokio::test]
async fn test_index_lifecycle_for_unknown_site() {
    let h = harness(IndexerSettings::default(), Vec::new(), MockFetcher::default());

    assert!(h.orchestrator.create_index(42).await.is_err());

    let reports = h.orchestrator.create_index(1).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].index_name, INDEX);
    let mapping = h.provider.get_mapping(INDEX).await.unwrap();
    assert_eq!(mapping["properties"]["content"]["analyzer"], json!("english"));

    h.orchestrator.remove_index(1).await.unwrap();
    assert!(!h.provider.index_exists(INDEX).await.unwrap());
}

#[tokio::test]
async fn test_first_item_creates_site_index() {
    let first = entry(30, "article", Some("https://example.com/first"));
    let second = entry(31, "article", Some("https://example.com/second"));
    let h = harness(
        IndexerSettings::default(),
        vec![
            with_headline(first.clone(), "First"),
            with_headline(second.clone(), "Second"),
        ],
        MockFetcher::default(),
    );

    let result = h.orchestrator.handle_event(ContentEvent::Saved(first)).await;
    assert_eq!(result.status, OutcomeStatus::Success);
    h.orchestrator.index_item(second.descriptor()).await;

    let calls = h.provider.calls().await;
    assert_eq!(calls[0], format!("create_index {INDEX}"));
    assert_eq!(
        calls.iter().filter(|call| call.starts_with("create_index")).count(),
        1
    );
    let mapping = h.provider.get_mapping(INDEX).await.unwrap();
    assert_eq!(mapping["properties"]["content"]["analyzer"], json!("english"));
}
