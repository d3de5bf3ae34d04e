//! Error types for the indexing pipeline.

use content_indexer_repository::SearchIndexError;
use thiserror::Error;

/// User-facing message for every storage failure.
pub const STORAGE_FAILURE_MESSAGE: &str = "The search engine could not store the document";

/// Errors that can occur while indexing a single item.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Bad or missing identifiers. Raised before any side effect.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The search engine rejected or never received a request.
    ///
    /// `message` is safe to show to users; `source` is kept for server-side logs.
    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: SearchIndexError,
    },

    /// Configuration that cannot be applied (e.g. unknown site).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The CMS collaborator failed to answer.
    #[error("Content source error: {0}")]
    Source(String),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn content_source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Wrap a search engine error behind the sanitized storage message.
    pub fn storage(source: SearchIndexError) -> Self {
        Self::Storage {
            message: STORAGE_FAILURE_MESSAGE.to_string(),
            source,
        }
    }
}

impl From<SearchIndexError> for PipelineError {
    fn from(err: SearchIndexError) -> Self {
        if let SearchIndexError::ValidationError(msg) = err {
            return Self::Validation(msg);
        }
        Self::storage(err)
    }
}

/// Errors raised while acquiring content. Always recovered by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The target resolves to a loopback, link-local, private or metadata address.
    #[error("blocked address: {0}")]
    Blocked(String),

    #[error("dns resolution failed: {0}")]
    Resolution(String),

    #[error("timeout")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("http status {0}")]
    Http(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("body error: {0}")]
    Body(String),
}

impl AcquisitionError {
    /// Short code reported in diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            AcquisitionError::InvalidUrl(_) => "invalid_url",
            AcquisitionError::UnsupportedScheme(_) => "unsupported_scheme",
            AcquisitionError::Blocked(_) => "blocked",
            AcquisitionError::Resolution(_) => "resolution",
            AcquisitionError::Timeout => "timeout",
            AcquisitionError::TooManyRedirects => "too_many_redirects",
            AcquisitionError::Http(_) => "http_status",
            AcquisitionError::Transport(_) => "transport",
            AcquisitionError::Body(_) => "body",
        }
    }

    /// True for errors raised by the address policy.
    pub fn is_ssrf(&self) -> bool {
        matches!(
            self,
            AcquisitionError::Blocked(_) | AcquisitionError::UnsupportedScheme(_)
        )
    }
}

impl From<reqwest::Error> for AcquisitionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        // Refusals from the resolver arrive wrapped in connect errors.
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            if let Some(refused) = inner.downcast_ref::<AcquisitionError>() {
                return refused.clone();
            }
            source = inner.source();
        }
        Self::Transport(err.to_string())
    }
}
