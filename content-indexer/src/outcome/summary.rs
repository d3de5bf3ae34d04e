//! Aggregate results of a bulk reindex.

use std::time::Duration;

use content_indexer_shared::{IndexableItemDescriptor, OutcomeResult, OutcomeStatus};
use serde::Serialize;

/// One failed item in a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub item: IndexableItemDescriptor,
    pub reason: String,
    pub message: String,
}

/// Tallies for one bulk reindex of a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReindexSummary {
    pub job_id: String,
    pub site_id: u64,
    pub success: usize,
    pub partial: usize,
    pub skipped: usize,
    pub disabled: usize,
    pub failed: usize,
    /// Items never attempted because the run was cancelled.
    pub cancelled: usize,
    pub failures: Vec<ItemFailure>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BulkReindexSummary {
    pub fn new(job_id: impl Into<String>, site_id: u64) -> Self {
        Self {
            job_id: job_id.into(),
            site_id,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: &OutcomeResult) {
        match result.status {
            OutcomeStatus::Success => self.success += 1,
            OutcomeStatus::Partial => self.partial += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
            OutcomeStatus::Disabled => self.disabled += 1,
            OutcomeStatus::Failed => {
                self.failed += 1;
                self.failures.push(ItemFailure {
                    item: result.item,
                    reason: result.reason.clone(),
                    message: result.message.clone(),
                });
            }
        }
    }

    /// Fold another site's summary into this one.
    pub fn merge(&mut self, other: BulkReindexSummary) {
        self.success += other.success;
        self.partial += other.partial;
        self.skipped += other.skipped;
        self.disabled += other.disabled;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.failures.extend(other.failures);
        self.elapsed += other.elapsed;
    }

    pub fn total(&self) -> usize {
        self.success + self.partial + self.skipped + self.disabled + self.failed + self.cancelled
    }

    /// Partial documents are reported as warnings.
    pub fn warnings(&self) -> usize {
        self.partial
    }

    /// Process exit code for a CLI run: 0 when nothing failed.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_indexer_shared::ItemKind;

    fn result(id: u64, status: OutcomeStatus) -> OutcomeResult {
        OutcomeResult::new(
            status,
            IndexableItemDescriptor::new(id, 1, ItemKind::Entry),
            "reason",
            "message",
        )
    }

    #[test]
    fn test_tallies_and_exit_code() {
        let mut summary = BulkReindexSummary::new("job", 1);
        summary.record(&result(1, OutcomeStatus::Success));
        summary.record(&result(2, OutcomeStatus::Partial));
        summary.record(&result(3, OutcomeStatus::Skipped));
        summary.record(&result(4, OutcomeStatus::Disabled));
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.warnings(), 1);

        summary.record(&result(5, OutcomeStatus::Failed));
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].item.item_id, 5);
    }

    #[test]
    fn test_merge() {
        let mut first = BulkReindexSummary::new("job", 1);
        first.record(&result(1, OutcomeStatus::Success));
        let mut second = BulkReindexSummary::new("job", 2);
        second.record(&result(2, OutcomeStatus::Failed));
        second.cancelled = 3;

        first.merge(second);

        assert_eq!(first.success, 1);
        assert_eq!(first.failed, 1);
        assert_eq!(first.cancelled, 3);
        assert_eq!(first.total(), 5);
    }
}
