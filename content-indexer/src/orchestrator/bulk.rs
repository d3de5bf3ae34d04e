//! Bulk reindex options and cancellation.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use content_indexer_shared::ItemKind;

/// Options for [`Orchestrator::reindex_site`](super::Orchestrator::reindex_site).
#[derive(Debug, Clone, Default)]
pub struct BulkOptions {
    /// Recreate the site's indexes before indexing any item.
    pub reset: bool,
    /// Concurrent indexing attempts. `None` uses the configured default.
    pub concurrency: Option<usize>,
    /// Kinds to reindex. `None` means every enabled kind.
    pub kinds: Option<BTreeSet<ItemKind>>,
}

/// Cooperative cancellation, checked before each item is started.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
