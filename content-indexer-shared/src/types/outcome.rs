//! Outcome types reported for every indexing attempt.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::descriptor::IndexableItemDescriptor;

/// Final status of one indexing attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Document stored; acquisition succeeded or wasn't required.
    Success,
    /// Document stored; a required content source failed.
    Partial,
    /// Not indexed for a data reason (status, missing URL, draft).
    Skipped,
    /// Not indexed because of operator configuration.
    Disabled,
    /// Assembly or storage raised an error.
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Partial => "partial",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Disabled => "disabled",
            OutcomeStatus::Failed => "failed",
        }
    }

    /// Returns true if the document was written to the store.
    pub fn is_stored(&self) -> bool {
        matches!(self, OutcomeStatus::Success | OutcomeStatus::Partial)
    }
}

/// Diagnostic about content acquisition.
///
/// Attached to an [`OutcomeResult`] only; it is never stored in the document.
/// Headers are only collected when debug mode is on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContentAcquisitionDiagnostic {
    pub attempted: bool,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Short machine-readable failure code (e.g. "timeout", "blocked").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Result of one indexing attempt, serializable for UI polling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeResult {
    pub status: OutcomeStatus,
    /// Machine-readable reason code (e.g. "entry_type_excluded").
    pub reason: String,
    /// User-facing message. Never contains raw engine responses.
    pub message: String,
    pub item: IndexableItemDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<ContentAcquisitionDiagnostic>,
}

impl OutcomeResult {
    pub fn new(
        status: OutcomeStatus,
        item: IndexableItemDescriptor,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            reason: reason.into(),
            message: message.into(),
            item,
            document_id: None,
            diagnostic: None,
        }
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: ContentAcquisitionDiagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::content_item::ItemKind;

    #[test]
    fn test_outcome_json() {
        let result = OutcomeResult::new(
            OutcomeStatus::Partial,
            IndexableItemDescriptor::new(9, 1, ItemKind::Entry),
            "content_unavailable",
            "Indexed without page content",
        )
        .with_document_id("9_1")
        .with_diagnostic(ContentAcquisitionDiagnostic {
            attempted: true,
            succeeded: false,
            url: Some("https://example.com/a".to_string()),
            error: Some("timeout".to_string()),
            ..Default::default()
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "partial");
        assert_eq!(json["reason"], "content_unavailable");
        assert_eq!(json["document_id"], "9_1");
        assert_eq!(json["diagnostic"]["error"], "timeout");
        assert!(json["diagnostic"].get("headers").is_none());
        assert!(json["diagnostic"].get("http_status").is_none());
    }

    #[test]
    fn test_is_stored() {
        assert!(OutcomeStatus::Success.is_stored());
        assert!(OutcomeStatus::Partial.is_stored());
        assert!(!OutcomeStatus::Skipped.is_stored());
        assert!(!OutcomeStatus::Disabled.is_stored());
        assert!(!OutcomeStatus::Failed.is_stored());
    }
}
