//! JSON snapshot content source.
//!
//! A snapshot is a static export of CMS content. It backs the binary (indexing
//! an export into a fresh cluster) and the tests.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use content_indexer_shared::{
    ContentItem, FieldLayout, FieldValue, IndexableItemDescriptor, ItemKind, SiteInfo,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::PipelineError;
use crate::source::ContentSource;

/// One exported item with its layout and raw field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotItem {
    #[serde(flatten)]
    pub item: ContentItem,
    #[serde(default)]
    pub layout: FieldLayout,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSnapshot {
    #[serde(default)]
    pub sites: Vec<SiteInfo>,
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
}

type ItemKey = (ItemKind, u64, u64);

/// [`ContentSource`] backed by an in-memory snapshot.
#[derive(Debug, Default)]
pub struct SnapshotContentSource {
    sites: BTreeMap<u64, SiteInfo>,
    items: HashMap<ItemKey, SnapshotItem>,
    /// Keys in snapshot order, so bulk runs are reproducible.
    order: Vec<ItemKey>,
}

impl SnapshotContentSource {
    pub fn new(snapshot: ContentSnapshot) -> Self {
        let mut source = Self::default();
        for site in snapshot.sites {
            source.sites.insert(site.id, site);
        }
        for item in snapshot.items {
            source.insert(item);
        }
        source
    }

    /// Load a snapshot from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::content_source(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let snapshot: ContentSnapshot = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::content_source(format!("Failed to parse '{}': {}", path.display(), e))
        })?;

        info!(
            path = %path.display(),
            sites = snapshot.sites.len(),
            items = snapshot.items.len(),
            "Loaded content snapshot"
        );
        Ok(Self::new(snapshot))
    }

    pub fn add_site(&mut self, site: SiteInfo) {
        self.sites.insert(site.id, site);
    }

    /// Add or replace an item.
    pub fn insert(&mut self, item: SnapshotItem) {
        let key = (item.item.kind(), item.item.id, item.item.site_id);
        if self.items.insert(key, item).is_none() {
            self.order.push(key);
        }
    }

    /// Remove an item, as a CMS delete would.
    pub fn remove(&mut self, descriptor: &IndexableItemDescriptor) -> Option<SnapshotItem> {
        let key = (descriptor.kind, descriptor.item_id, descriptor.site_id);
        self.order.retain(|existing| *existing != key);
        self.items.remove(&key)
    }

    fn entry(&self, item: &ContentItem) -> Option<&SnapshotItem> {
        self.items.get(&(item.kind(), item.id, item.site_id))
    }
}

#[async_trait]
impl ContentSource for SnapshotContentSource {
    async fn get_item(
        &self,
        kind: ItemKind,
        item_id: u64,
        site_id: u64,
    ) -> Result<Option<ContentItem>, PipelineError> {
        Ok(self
            .items
            .get(&(kind, item_id, site_id))
            .map(|entry| entry.item.clone()))
    }

    async fn items_for_site(
        &self,
        site_id: u64,
        kinds: &[ItemKind],
    ) -> Result<Vec<IndexableItemDescriptor>, PipelineError> {
        Ok(self
            .order
            .iter()
            .filter(|(kind, _, site)| *site == site_id && kinds.contains(kind))
            .map(|(kind, item_id, site)| IndexableItemDescriptor::new(*item_id, *site, *kind))
            .collect())
    }

    fn site(&self, site_id: u64) -> Option<SiteInfo> {
        self.sites.get(&site_id).cloned()
    }

    fn sites(&self) -> Vec<SiteInfo> {
        self.sites.values().cloned().collect()
    }

    fn field_layout(&self, item: &ContentItem) -> FieldLayout {
        self.entry(item)
            .map(|entry| entry.layout.clone())
            .unwrap_or_default()
    }

    fn field_value(&self, item: &ContentItem, handle: &str) -> Option<FieldValue> {
        self.entry(item)
            .and_then(|entry| entry.fields.get(handle))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "sites": [ { "id": 1, "handle": "default", "language": "en-GB" } ],
        "items": [
            {
                "id": 10,
                "site_id": 1,
                "title": "Hello World",
                "status": "live",
                "url": "https://example.com/hello",
                "date_created": "2024-01-01T00:00:00Z",
                "date_updated": "2024-01-02T00:00:00Z",
                "attributes": { "kind": "entry", "section": "news", "entry_type": "article" },
                "layout": [
                    { "handle": "body", "field_type": "rich_text", "searchable": true }
                ],
                "fields": { "body": { "type": "text", "value": "<p>Welcome</p>" } }
            },
            {
                "id": 11,
                "site_id": 1,
                "title": "brochure.pdf",
                "status": "enabled",
                "date_created": "2024-01-01T00:00:00Z",
                "date_updated": "2024-01-01T00:00:00Z",
                "attributes": {
                    "kind": "asset", "volume": "documents",
                    "filename": "brochure.pdf", "asset_kind": "pdf"
                }
            }
        ]
    }"#;

    fn source() -> SnapshotContentSource {
        SnapshotContentSource::new(serde_json::from_str(SNAPSHOT).unwrap())
    }

    #[tokio::test]
    async fn test_get_item_and_fields() {
        let source = source();
        let item = source
            .get_item(ItemKind::Entry, 10, 1)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(item.title, "Hello World");
        assert_eq!(source.field_layout(&item).len(), 1);
        assert_eq!(
            source.field_value(&item, "body"),
            Some(FieldValue::Text("<p>Welcome</p>".to_string()))
        );
        assert!(source.field_value(&item, "missing").is_none());
    }

    #[tokio::test]
    async fn test_missing_item_and_wrong_kind() {
        let source = source();
        assert!(source.get_item(ItemKind::Entry, 99, 1).await.unwrap().is_none());
        assert!(source.get_item(ItemKind::Asset, 10, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_items_for_site_filters_kinds() {
        let source = source();
        let all = source.items_for_site(1, &ItemKind::ALL).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].item_id, 10);

        let assets = source.items_for_site(1, &[ItemKind::Asset]).await.unwrap();
        assert_eq!(assets, vec![IndexableItemDescriptor::new(11, 1, ItemKind::Asset)]);

        assert!(source.items_for_site(2, &ItemKind::ALL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let mut source = source();
        let descriptor = IndexableItemDescriptor::new(10, 1, ItemKind::Entry);
        assert!(source.remove(&descriptor).is_some());
        assert!(source.get_item(ItemKind::Entry, 10, 1).await.unwrap().is_none());
        assert_eq!(source.items_for_site(1, &ItemKind::ALL).await.unwrap().len(), 1);
    }

    #[test]
    fn test_sites() {
        let source = source();
        assert_eq!(source.site(1).unwrap().language, "en-GB");
        assert!(source.site(2).is_none());
        assert_eq!(source.sites().len(), 1);
    }
}
