//! Orchestrator for the indexing pipeline.
//!
//! Sequences eligibility, acquisition, assembly and storage for each item,
//! reacts to CMS lifecycle events, manages site indexes and runs bulk
//! reindexes. Every collaborator is passed in explicitly.

mod bulk;
mod locks;

pub use bulk::{BulkOptions, CancellationFlag};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use content_indexer_repository::{
    validate_item_and_site_ids, IndexManager, IndexOperationReport, SearchIndexService,
};
use content_indexer_shared::{
    ContentItem, Document, IndexableItemDescriptor, ItemKind, OutcomeResult, OutcomeStatus,
    SiteInfo,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::acquisition::AcquisitionEngine;
use crate::assembler::DocumentAssembler;
use crate::config::IndexerSettings;
use crate::eligibility::{EligibilityClassifier, SkipReason};
use crate::errors::PipelineError;
use crate::outcome::{BulkReindexSummary, OutcomeReporter};
use crate::source::ContentSource;

use locks::SiteLocks;

/// A CMS lifecycle event.
#[derive(Debug, Clone)]
pub enum ContentEvent {
    /// An item was created or updated.
    Saved(ContentItem),
    /// An item was deleted.
    Deleted(IndexableItemDescriptor),
}

/// Coordinates the pipeline components.
pub struct Orchestrator {
    settings: Arc<IndexerSettings>,
    source: Arc<dyn ContentSource>,
    classifier: EligibilityClassifier,
    acquisition: AcquisitionEngine,
    assembler: DocumentAssembler,
    reporter: OutcomeReporter,
    indexes: IndexManager,
    store: SearchIndexService,
    site_locks: SiteLocks,
    /// Sites whose indexes this orchestrator has created or found.
    prepared_sites: Mutex<HashSet<u64>>,
}

impl Orchestrator {
    /// Create an orchestrator from its components.
    ///
    /// `indexes` must be built from the same settings, with the assembler's
    /// extra-field mapping hints.
    pub fn new(
        settings: Arc<IndexerSettings>,
        source: Arc<dyn ContentSource>,
        acquisition: AcquisitionEngine,
        assembler: DocumentAssembler,
        indexes: IndexManager,
        store: SearchIndexService,
    ) -> Self {
        Self {
            classifier: EligibilityClassifier::new(settings.clone()),
            reporter: OutcomeReporter::new(settings.debug),
            settings,
            source,
            acquisition,
            assembler,
            indexes,
            store,
            site_locks: SiteLocks::default(),
            prepared_sites: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_reporter(mut self, reporter: OutcomeReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    /// Index the item behind `descriptor`, re-fetching it from the CMS first.
    #[instrument(skip(self), fields(item_id = descriptor.item_id, site_id = descriptor.site_id))]
    pub async fn index_item(&self, descriptor: IndexableItemDescriptor) -> OutcomeResult {
        if let Err(e) = validate_item_and_site_ids(descriptor.item_id, descriptor.site_id) {
            return self.reporter.failed(descriptor, &PipelineError::from(e));
        }

        let fetched = self
            .source
            .get_item(descriptor.kind, descriptor.item_id, descriptor.site_id)
            .await;
        match fetched {
            Ok(Some(item)) => self.index_content_item(&item).await,
            Ok(None) => {
                debug!("Item no longer exists in the CMS");
                self.reporter.skipped(descriptor, &SkipReason::ItemNotFound)
            }
            Err(e) => {
                error!(error = %e, "Failed to load item from the CMS");
                self.reporter.failed(descriptor, &e)
            }
        }
    }

    /// Index an item already loaded from the CMS.
    ///
    /// The site's indexes are created on first use, so documents never land
    /// in an index the engine created with a dynamic mapping.
    #[instrument(
        skip(self, item),
        fields(item_id = item.id, site_id = item.site_id, kind = item.kind().as_str())
    )]
    pub async fn index_content_item(&self, item: &ContentItem) -> OutcomeResult {
        let descriptor = item.descriptor();
        if let Err(e) = validate_item_and_site_ids(item.id, item.site_id) {
            return self.reporter.failed(descriptor, &PipelineError::from(e));
        }

        let eligibility = self.classifier.classify(item);
        if let Some(reason) = &eligibility.disabled_reason {
            debug!(reason = reason.code(), "Item disabled by configuration");
            return self.reporter.disabled(descriptor, reason);
        }
        if let Some(reason) = &eligibility.skip_reason {
            debug!(reason = reason.code(), "Item skipped");
            return self.reporter.skipped(descriptor, reason);
        }

        if let Err(e) = self.ensure_indexes(item.site_id).await {
            error!(error = %e, "Failed to prepare site indexes");
            return self.reporter.failed(descriptor, &e);
        }

        let _guard = self.site_locks.shared(item.site_id).await;

        let acquisition = self.acquisition.acquire(item).await;
        let document = self.assembler.assemble(item, &acquisition, Utc::now());
        let index = self.index_name(item.kind(), item.site_id);

        match self.store.store(&index, &document).await {
            Ok(()) => {
                let result = self.reporter.stored(descriptor, document.id(), &acquisition);
                info!(
                    index = %index,
                    document_id = %document.id(),
                    status = result.status.as_str(),
                    has_content = document.content().is_some(),
                    "Item indexed"
                );
                result
            }
            Err(e) => {
                error!(
                    index = %index,
                    document_id = %document.id(),
                    error = %e,
                    "Failed to store document"
                );
                self.reporter.failed(descriptor, &PipelineError::from(e))
            }
        }
    }

    /// Remove the document of `descriptor` from its index.
    #[instrument(skip(self), fields(item_id = descriptor.item_id, site_id = descriptor.site_id))]
    pub async fn remove_item(&self, descriptor: IndexableItemDescriptor) -> OutcomeResult {
        let index = self.index_name(descriptor.kind, descriptor.site_id);
        let document_id = Document::document_id(descriptor.item_id, descriptor.site_id);

        let _guard = self.site_locks.shared(descriptor.site_id).await;
        match self
            .store
            .remove(&index, descriptor.item_id, descriptor.site_id)
            .await
        {
            Ok(()) => {
                info!(index = %index, document_id = %document_id, "Document removed");
                self.reporter.removed(descriptor, &document_id)
            }
            Err(e) => {
                error!(
                    index = %index,
                    document_id = %document_id,
                    error = %e,
                    "Failed to remove document"
                );
                self.reporter.failed(descriptor, &PipelineError::from(e))
            }
        }
    }

    /// React to a CMS lifecycle event.
    ///
    /// A saved item that is no longer indexable has its stale document removed;
    /// the returned result still reports why it was not indexed.
    pub async fn handle_event(&self, event: ContentEvent) -> OutcomeResult {
        match event {
            ContentEvent::Saved(item) => {
                let result = self.index_content_item(&item).await;
                if matches!(result.status, OutcomeStatus::Skipped | OutcomeStatus::Disabled) {
                    let removal = self.remove_item(item.descriptor()).await;
                    if removal.status == OutcomeStatus::Failed {
                        warn!(
                            item_id = item.id,
                            site_id = item.site_id,
                            "Failed to remove stale document of a non-indexable item"
                        );
                    }
                }
                result
            }
            ContentEvent::Deleted(descriptor) => self.remove_item(descriptor).await,
        }
    }

    /// Create the missing indexes of a site.
    pub async fn create_index(
        &self,
        site_id: u64,
    ) -> Result<Vec<IndexOperationReport>, PipelineError> {
        let site = self.site(site_id)?;
        let _guard = self.site_locks.exclusive(site_id).await;
        let reports = self.indexes.create(&site).await?;
        self.set_prepared(site_id, true);
        Ok(reports)
    }

    /// Delete the indexes of a site.
    pub async fn remove_index(
        &self,
        site_id: u64,
    ) -> Result<Vec<IndexOperationReport>, PipelineError> {
        let site = self.site(site_id)?;
        let _guard = self.site_locks.exclusive(site_id).await;
        self.set_prepared(site_id, false);
        Ok(self.indexes.remove(&site).await?)
    }

    /// Drop and rebuild the indexes of a site with the current mapping.
    pub async fn recreate_index(
        &self,
        site_id: u64,
    ) -> Result<Vec<IndexOperationReport>, PipelineError> {
        let site = self.site(site_id)?;
        let _guard = self.site_locks.exclusive(site_id).await;
        self.set_prepared(site_id, false);
        let reports = self.indexes.recreate(&site).await?;
        self.set_prepared(site_id, true);
        Ok(reports)
    }

    /// Reindex every item of a site.
    ///
    /// With `reset`, the indexes are recreated before any item is started.
    /// Individual failures are counted and never stop the run; cancellation
    /// is checked before each item.
    #[instrument(skip(self, options, cancel), fields(job_id = tracing::field::Empty))]
    pub async fn reindex_site(
        &self,
        site_id: u64,
        options: BulkOptions,
        cancel: &CancellationFlag,
    ) -> Result<BulkReindexSummary, PipelineError> {
        let started = Instant::now();
        let job_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("job_id", job_id.as_str());

        if options.reset {
            self.recreate_index(site_id).await?;
        } else {
            self.create_index(site_id).await?;
        }

        let kinds: Vec<ItemKind> = options
            .kinds
            .unwrap_or_else(|| self.settings.enabled_kinds())
            .into_iter()
            .collect();
        let descriptors = self.source.items_for_site(site_id, &kinds).await?;
        let concurrency = options
            .concurrency
            .unwrap_or(self.settings.bulk.concurrency)
            .max(1);

        info!(
            site_id,
            items = descriptors.len(),
            concurrency,
            reset = options.reset,
            "Starting bulk reindex"
        );

        let results: Vec<Option<OutcomeResult>> = stream::iter(descriptors)
            .map(|descriptor| async move {
                if cancel.is_cancelled() {
                    None
                } else {
                    Some(self.index_item(descriptor).await)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = BulkReindexSummary::new(job_id, site_id);
        for result in &results {
            match result {
                Some(result) => summary.record(result),
                None => summary.cancelled += 1,
            }
        }
        summary.elapsed = started.elapsed();

        info!(
            site_id,
            success = summary.success,
            partial = summary.partial,
            skipped = summary.skipped,
            disabled = summary.disabled,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Bulk reindex finished"
        );
        Ok(summary)
    }

    async fn ensure_indexes(&self, site_id: u64) -> Result<(), PipelineError> {
        if self.is_prepared(site_id) {
            return Ok(());
        }
        debug!(site_id, "Creating site indexes on first use");
        self.create_index(site_id).await.map(|_| ())
    }

    fn is_prepared(&self, site_id: u64) -> bool {
        self.prepared_sites
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&site_id)
    }

    fn set_prepared(&self, site_id: u64, prepared: bool) {
        let mut sites = self
            .prepared_sites
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if prepared {
            sites.insert(site_id);
        } else {
            sites.remove(&site_id);
        }
    }

    fn index_name(&self, kind: ItemKind, site_id: u64) -> String {
        self.indexes.schema_config().naming.index_name(kind, site_id)
    }

    fn site(&self, site_id: u64) -> Result<SiteInfo, PipelineError> {
        self.source
            .site(site_id)
            .ok_or_else(|| PipelineError::configuration(format!("unknown site {site_id}")))
    }
}
