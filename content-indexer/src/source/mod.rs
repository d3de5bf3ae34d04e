//! The CMS collaborator consumed by the pipeline.
//!
//! The pipeline never reaches into the CMS directly: items, field layouts and
//! raw field values are all obtained through [`ContentSource`].

mod snapshot;

pub use snapshot::{ContentSnapshot, SnapshotContentSource, SnapshotItem};

use async_trait::async_trait;
use content_indexer_shared::{
    ContentItem, FieldLayout, FieldValue, IndexableItemDescriptor, ItemKind, SiteInfo,
};

use crate::errors::PipelineError;

/// Read-only access to CMS content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the current state of an item. `Ok(None)` if it no longer exists.
    async fn get_item(
        &self,
        kind: ItemKind,
        item_id: u64,
        site_id: u64,
    ) -> Result<Option<ContentItem>, PipelineError>;

    /// Every item of `kinds` on `site_id`, for bulk reindexing.
    async fn items_for_site(
        &self,
        site_id: u64,
        kinds: &[ItemKind],
    ) -> Result<Vec<IndexableItemDescriptor>, PipelineError>;

    /// Site metadata, or `None` for an unknown site.
    fn site(&self, site_id: u64) -> Option<SiteInfo>;

    /// Every site of the deployment.
    fn sites(&self) -> Vec<SiteInfo>;

    /// Field layout of `item`. Items without custom fields have an empty layout.
    fn field_layout(&self, item: &ContentItem) -> FieldLayout;

    /// Raw value of the field `handle` on `item`.
    fn field_value(&self, item: &ContentItem, handle: &str) -> Option<FieldValue>;
}
