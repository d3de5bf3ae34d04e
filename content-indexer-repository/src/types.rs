//! Context and report types for index lifecycle operations.

use content_indexer_shared::SiteInfo;
use serde_json::Value;

/// Index lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOperation {
    Create,
    Delete,
    Recreate,
}

impl IndexOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOperation::Create => "create",
            IndexOperation::Delete => "delete",
            IndexOperation::Recreate => "recreate",
        }
    }
}

/// Mutable context handed to lifecycle hooks.
///
/// Before-hooks may rewrite `mapping` (create and recreate only) or set
/// `skip_default` to suppress the default engine call. After-hooks observe
/// the final context and the resulting action.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOperationContext {
    pub operation: IndexOperation,
    pub index_name: String,
    pub site: SiteInfo,
    /// The `mappings` section about to be applied. `None` for deletes.
    pub mapping: Option<Value>,
    pub skip_default: bool,
    /// Set once the default operation has run (or was skipped).
    pub action: Option<IndexAction>,
}

impl IndexOperationContext {
    pub fn new(
        operation: IndexOperation,
        index_name: impl Into<String>,
        site: SiteInfo,
        mapping: Option<Value>,
    ) -> Self {
        Self {
            operation,
            index_name: index_name.into(),
            site,
            mapping,
            skip_default: false,
            action: None,
        }
    }
}

/// What happened to one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    Created,
    AlreadyExisted,
    Deleted,
    Absent,
    Recreated,
    /// A before-hook set `skip_default`.
    Skipped,
}

/// Result of a lifecycle operation on one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOperationReport {
    pub index_name: String,
    pub operation: IndexOperation,
    pub action: IndexAction,
}
