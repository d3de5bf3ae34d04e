//! Index lifecycle management.
//!
//! `IndexManager` creates, removes and recreates every index a site uses.
//! Mappings are rebuilt from the current [`SchemaConfig`] on each call.

use std::collections::BTreeMap;
use std::sync::Arc;

use content_indexer_shared::{guard, ExtensionResult, SiteInfo};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::SchemaConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::IndexSchema;
use crate::types::{IndexAction, IndexOperation, IndexOperationContext, IndexOperationReport};

/// Lifecycle hook. Runs on a copy of the context; changes to `mapping` and
/// `skip_default` are kept only if it returns `Ok`. The index name, operation
/// and site are fixed.
pub type IndexHook = Box<dyn Fn(&mut IndexOperationContext) -> ExtensionResult<()> + Send + Sync>;

/// Ordered before/after hooks around index operations.
#[derive(Default)]
pub struct IndexHooks {
    before: Vec<(String, IndexHook)>,
    after: Vec<(String, IndexHook)>,
}

impl IndexHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook run before the default operation.
    pub fn before(
        mut self,
        name: impl Into<String>,
        hook: impl Fn(&mut IndexOperationContext) -> ExtensionResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.before.push((name.into(), Box::new(hook)));
        self
    }

    /// Register a hook run after the default operation.
    pub fn after(
        mut self,
        name: impl Into<String>,
        hook: impl Fn(&mut IndexOperationContext) -> ExtensionResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.after.push((name.into(), Box::new(hook)));
        self
    }

    fn run(hooks: &[(String, IndexHook)], context: &mut IndexOperationContext) {
        for (name, hook) in hooks {
            let mut candidate = context.clone();
            if guard(name, || hook(&mut candidate)).is_none() {
                continue;
            }
            if candidate.index_name != context.index_name {
                warn!(
                    hook = %name,
                    index = %context.index_name,
                    "Hook tried to rename the index, keeping the original name"
                );
            }
            context.mapping = candidate.mapping;
            context.skip_default = candidate.skip_default;
        }
    }
}

/// Creates, removes and recreates the indexes of a site.
pub struct IndexManager {
    provider: Arc<dyn SearchIndexProvider>,
    schema: SchemaConfig,
    hooks: IndexHooks,
}

impl IndexManager {
    pub fn new(provider: Arc<dyn SearchIndexProvider>, schema: SchemaConfig) -> Self {
        Self {
            provider,
            schema,
            hooks: IndexHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: IndexHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn schema_config(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Create every missing index of `site`. Existing indexes are left alone.
    #[instrument(skip(self, site), fields(site_id = site.id))]
    pub async fn create(
        &self,
        site: &SiteInfo,
    ) -> Result<Vec<IndexOperationReport>, SearchIndexError> {
        let mut reports = Vec::new();
        for index_name in self.schema.site_index_names(site.id) {
            reports.push(self.create_index(site, &index_name).await?);
        }
        Ok(reports)
    }

    /// Delete every index of `site`. Missing indexes are not an error.
    #[instrument(skip(self, site), fields(site_id = site.id))]
    pub async fn remove(
        &self,
        site: &SiteInfo,
    ) -> Result<Vec<IndexOperationReport>, SearchIndexError> {
        let mut reports = Vec::new();
        for index_name in self.schema.site_index_names(site.id) {
            reports.push(self.remove_index(site, &index_name).await?);
        }
        Ok(reports)
    }

    /// Delete then create every index of `site` with a freshly built mapping.
    #[instrument(skip(self, site), fields(site_id = site.id))]
    pub async fn recreate(
        &self,
        site: &SiteInfo,
    ) -> Result<Vec<IndexOperationReport>, SearchIndexError> {
        let mut reports = Vec::new();
        for index_name in self.schema.site_index_names(site.id) {
            reports.push(self.recreate_index(site, &index_name).await?);
        }
        Ok(reports)
    }

    /// Mapping currently applied to each index of `site`, keyed by index name.
    pub async fn current_mapping(
        &self,
        site: &SiteInfo,
    ) -> Result<BTreeMap<String, Value>, SearchIndexError> {
        let mut mappings = BTreeMap::new();
        for index_name in self.schema.site_index_names(site.id) {
            let mapping = self.provider.get_mapping(&index_name).await?;
            mappings.insert(index_name, mapping);
        }
        Ok(mappings)
    }

    async fn create_index(
        &self,
        site: &SiteInfo,
        index_name: &str,
    ) -> Result<IndexOperationReport, SearchIndexError> {
        let schema = IndexSchema::build(&self.schema, site, index_name);
        let mut context = IndexOperationContext::new(
            IndexOperation::Create,
            index_name,
            site.clone(),
            Some(schema.mappings()),
        );
        IndexHooks::run(&self.hooks.before, &mut context);

        let action = if context.skip_default {
            IndexAction::Skipped
        } else if self.provider.index_exists(index_name).await? {
            IndexAction::AlreadyExisted
        } else {
            self.issue_create(&schema, &context).await?
        };

        Ok(self.finish(context, action))
    }

    async fn remove_index(
        &self,
        site: &SiteInfo,
        index_name: &str,
    ) -> Result<IndexOperationReport, SearchIndexError> {
        let mut context =
            IndexOperationContext::new(IndexOperation::Delete, index_name, site.clone(), None);
        IndexHooks::run(&self.hooks.before, &mut context);

        let action = if context.skip_default {
            IndexAction::Skipped
        } else if !self.provider.index_exists(index_name).await? {
            IndexAction::Absent
        } else {
            self.issue_delete(index_name).await?
        };

        Ok(self.finish(context, action))
    }

    async fn recreate_index(
        &self,
        site: &SiteInfo,
        index_name: &str,
    ) -> Result<IndexOperationReport, SearchIndexError> {
        let schema = IndexSchema::build(&self.schema, site, index_name);
        let mut context = IndexOperationContext::new(
            IndexOperation::Recreate,
            index_name,
            site.clone(),
            Some(schema.mappings()),
        );
        IndexHooks::run(&self.hooks.before, &mut context);

        let action = if context.skip_default {
            IndexAction::Skipped
        } else {
            self.issue_delete(index_name).await?;
            self.issue_create(&schema, &context).await?;
            IndexAction::Recreated
        };

        Ok(self.finish(context, action))
    }

    /// Create the index; losing a creation race counts as success.
    async fn issue_create(
        &self,
        schema: &IndexSchema,
        context: &IndexOperationContext,
    ) -> Result<IndexAction, SearchIndexError> {
        let body = match &context.mapping {
            Some(mapping) if mapping.is_object() => schema.body_with(mapping.clone()),
            Some(_) => {
                warn!(
                    index = %context.index_name,
                    "Hook produced a non-object mapping, using generated one"
                );
                schema.to_body()
            }
            None => schema.to_body(),
        };

        match self.provider.create_index(&context.index_name, &body).await {
            Ok(()) => Ok(IndexAction::Created),
            Err(SearchIndexError::IndexAlreadyExists(_)) => {
                info!(index = %context.index_name, "Index created concurrently");
                Ok(IndexAction::AlreadyExisted)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the index; an index that is already gone counts as success.
    async fn issue_delete(&self, index_name: &str) -> Result<IndexAction, SearchIndexError> {
        match self.provider.delete_index(index_name).await {
            Ok(()) => Ok(IndexAction::Deleted),
            Err(SearchIndexError::IndexNotFound(_)) => Ok(IndexAction::Absent),
            Err(e) => Err(e),
        }
    }

    fn finish(&self, mut context: IndexOperationContext, action: IndexAction) -> IndexOperationReport {
        context.action = Some(action);
        IndexHooks::run(&self.hooks.after, &mut context);

        info!(
            index = %context.index_name,
            operation = context.operation.as_str(),
            action = ?action,
            "Index operation finished"
        );

        IndexOperationReport {
            index_name: context.index_name,
            operation: context.operation,
            action,
        }
    }
}
