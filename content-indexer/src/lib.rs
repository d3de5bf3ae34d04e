//! # Content Indexer
//!
//! Indexing pipeline that turns CMS content items into OpenSearch documents
//! and keeps the index in step with content changes.
//!
//! ## Architecture
//!
//! Each item goes through the same stages:
//!
//! 1. **Eligibility**: decides whether and why an item is indexed
//! 2. **Acquisition**: obtains text from structured fields or the public page
//! 3. **Assembly**: builds the document field map
//! 4. **Storage**: writes the document and reports an outcome
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`source`]: The CMS collaborator
//! - [`eligibility`]: Eligibility rules
//! - [`acquisition`]: Structured extraction and frontend fetch
//! - [`assembler`]: Document assembly and extra fields
//! - [`outcome`]: Outcome results and bulk summaries
//! - [`orchestrator`]: Per-item flow, lifecycle events and bulk reindexing
//! - [`errors`]: Error types for the pipeline

pub mod acquisition;
pub mod assembler;
pub mod config;
pub mod eligibility;
pub mod errors;
pub mod orchestrator;
pub mod outcome;
pub mod source;

pub use config::Dependencies;
pub use errors::PipelineError;
pub use orchestrator::{BulkOptions, CancellationFlag, ContentEvent, Orchestrator};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
