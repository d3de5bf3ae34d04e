//! Outcome classification.
//!
//! Every indexing attempt ends in exactly one [`OutcomeResult`]. Eligibility
//! failures become Skipped or Disabled without touching the store; stored
//! documents are Success or Partial depending on acquisition; errors during
//! assembly or storage become Failed with a sanitized message.

mod summary;

pub use summary::{BulkReindexSummary, ItemFailure};

use content_indexer_shared::{
    guard, ExtensionResult, IndexableItemDescriptor, OutcomeResult, OutcomeStatus,
};

use crate::acquisition::AcquisitionOutput;
use crate::eligibility::{DisabledReason, SkipReason};
use crate::errors::PipelineError;

pub const REASON_INDEXED: &str = "indexed";
pub const REASON_CONTENT_UNAVAILABLE: &str = "content_unavailable";
pub const REASON_REMOVED: &str = "removed";

/// Rewrites the message of a result. `Ok(None)` keeps the current message.
pub type ResultFormatter =
    Box<dyn Fn(&OutcomeResult) -> ExtensionResult<Option<String>> + Send + Sync>;

/// Builds outcome results and runs the registered formatters over them.
#[derive(Default)]
pub struct OutcomeReporter {
    debug: bool,
    formatters: Vec<(String, ResultFormatter)>,
}

impl OutcomeReporter {
    /// With `debug` on, a diagnostic is attached even when no fetch ran.
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            formatters: Vec::new(),
        }
    }

    pub fn with_formatter(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&OutcomeResult) -> ExtensionResult<Option<String>> + Send + Sync + 'static,
    ) -> Self {
        self.formatters.push((name.into(), Box::new(f)));
        self
    }

    pub fn skipped(&self, item: IndexableItemDescriptor, reason: &SkipReason) -> OutcomeResult {
        self.format(OutcomeResult::new(
            OutcomeStatus::Skipped,
            item,
            reason.code(),
            reason.message(),
        ))
    }

    pub fn disabled(
        &self,
        item: IndexableItemDescriptor,
        reason: &DisabledReason,
    ) -> OutcomeResult {
        self.format(OutcomeResult::new(
            OutcomeStatus::Disabled,
            item,
            reason.code(),
            reason.message(),
        ))
    }

    /// Result for a stored document: Partial when a required content source failed.
    pub fn stored(
        &self,
        item: IndexableItemDescriptor,
        document_id: &str,
        acquisition: &AcquisitionOutput,
    ) -> OutcomeResult {
        let result = if acquisition.is_partial() {
            let detail = acquisition
                .diagnostic
                .error
                .as_deref()
                .unwrap_or("no content");
            OutcomeResult::new(
                OutcomeStatus::Partial,
                item,
                REASON_CONTENT_UNAVAILABLE,
                format!("Indexed without content: frontend fetch failed ({detail})"),
            )
        } else {
            OutcomeResult::new(OutcomeStatus::Success, item, REASON_INDEXED, "Indexed")
        }
        .with_document_id(document_id);

        let result = if acquisition.diagnostic.attempted || self.debug {
            result.with_diagnostic(acquisition.diagnostic.clone())
        } else {
            result
        };
        self.format(result)
    }

    /// Result for a document removed from the index.
    pub fn removed(&self, item: IndexableItemDescriptor, document_id: &str) -> OutcomeResult {
        self.format(
            OutcomeResult::new(OutcomeStatus::Success, item, REASON_REMOVED, "Removed from index")
                .with_document_id(document_id),
        )
    }

    /// Result for an attempt that raised an error.
    ///
    /// Storage errors only expose the sanitized message; the engine's own
    /// error stays in the server-side logs.
    pub fn failed(&self, item: IndexableItemDescriptor, err: &PipelineError) -> OutcomeResult {
        let (reason, message) = match err {
            PipelineError::Validation(_) => ("validation_failed", err.to_string()),
            PipelineError::Storage { message, .. } => ("storage_failed", message.clone()),
            PipelineError::Configuration(_) => ("configuration_failed", err.to_string()),
            PipelineError::Source(_) => ("content_source_failed", err.to_string()),
        };
        self.format(OutcomeResult::new(OutcomeStatus::Failed, item, reason, message))
    }

    fn format(&self, mut result: OutcomeResult) -> OutcomeResult {
        for (name, f) in &self.formatters {
            if let Some(message) = guard(name, || f(&result)).flatten() {
                result.message = message;
            }
        }
        result
    }
}
