//! Content acquisition.
//!
//! Two strategies produce the text of a document: structured extraction from
//! the item's typed fields, and a fetch of its public page. Which runs first
//! depends on `prefer_structured_fields`; the other is the fallback. No
//! acquisition error ever leaves this module: failures are recorded in the
//! diagnostic and the document is assembled without content.

mod extensions;
mod frontend;
mod html;
mod ssrf;
mod structured;
mod transforms;

pub use extensions::{AcquisitionExtensions, ContentOverride, PostExtractionHook, PreExtractionHook};
pub use frontend::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use html::{html_to_text, strip_control_chars, TRUNCATION_MARKER};
pub use ssrf::{is_blocked_ip, AddressPolicy};
pub use structured::{combined_content, has_usable_content, ExtractedField, StructuredExtractor};

use std::sync::Arc;

use content_indexer_shared::{ContentAcquisitionDiagnostic, ContentItem};
use tracing::{debug, warn};
use url::Url;

use crate::config::IndexerSettings;
use crate::errors::AcquisitionError;
use crate::source::ContentSource;

/// Where the final content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStrategy {
    Override,
    Structured,
    Frontend,
}

/// Result of acquiring content for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionOutput {
    /// Non-empty text, or `None`.
    pub content: Option<String>,
    pub strategy: Option<ContentStrategy>,
    pub fields: Vec<ExtractedField>,
    /// Frontend fetch diagnostic. `attempted` is false when no fetch ran.
    pub diagnostic: ContentAcquisitionDiagnostic,
    /// False for binary assets, whose missing text is expected.
    pub content_required: bool,
    /// The content was cut at the size cap.
    pub truncated: bool,
}

impl AcquisitionOutput {
    fn new(content_required: bool) -> Self {
        Self {
            content: None,
            strategy: None,
            fields: Vec::new(),
            diagnostic: ContentAcquisitionDiagnostic::default(),
            content_required,
            truncated: false,
        }
    }

    /// A required fetch failed and nothing else produced content.
    pub fn is_partial(&self) -> bool {
        self.content_required
            && self.diagnostic.attempted
            && !self.diagnostic.succeeded
            && self.content.is_none()
    }

    fn set_content(&mut self, text: String, strategy: ContentStrategy) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.content = Some(text);
        self.strategy = Some(strategy);
        true
    }
}

/// Runs the acquisition strategies for an item.
pub struct AcquisitionEngine {
    settings: Arc<IndexerSettings>,
    source: Arc<dyn ContentSource>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: StructuredExtractor,
    extensions: AcquisitionExtensions,
}

impl AcquisitionEngine {
    pub fn new(
        settings: Arc<IndexerSettings>,
        source: Arc<dyn ContentSource>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let extractor = StructuredExtractor::new(settings.forced_searchable_fields.clone());
        Self {
            settings,
            source,
            fetcher,
            extractor,
            extensions: AcquisitionExtensions::default(),
        }
    }

    pub fn with_extensions(mut self, extensions: AcquisitionExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub async fn acquire(&self, item: &ContentItem) -> AcquisitionOutput {
        let mut output = AcquisitionOutput::new(!item.is_binary());

        let layout = self.source.field_layout(item);
        output.fields = self
            .extractor
            .extract(&layout, |handle| self.source.field_value(item, handle));

        if let Some(text) = self.extensions.override_content(item) {
            output.set_content(text, ContentStrategy::Override);
        } else if self.settings.prefer_structured_fields {
            if !self.use_structured(item, &mut output)
                && self.settings.fallback_to_frontend_fetch
                && self.fetch_allowed(item)
            {
                self.fetch_into(item, &mut output).await;
            }
        } else {
            if self.fetch_allowed(item) {
                self.fetch_into(item, &mut output).await;
            }
            if output.content.is_none() {
                self.use_structured(item, &mut output);
            }
        }

        if let Some(text) = output.content.take() {
            let text = self.extensions.post_extract(item, text);
            let text = html::bound_content(text, self.settings.fetch.max_bytes, output.truncated);
            output.truncated = text.ends_with(TRUNCATION_MARKER);
            output.content = (!text.trim().is_empty()).then_some(text);
        }

        debug!(
            item_id = item.id,
            site_id = item.site_id,
            strategy = ?output.strategy,
            fetch_attempted = output.diagnostic.attempted,
            fetch_succeeded = output.diagnostic.succeeded,
            "Content acquired"
        );
        output
    }

    fn fetch_allowed(&self, item: &ContentItem) -> bool {
        self.settings.frontend_fetch(item.kind()) && item.has_url()
    }

    fn use_structured(&self, item: &ContentItem, output: &mut AcquisitionOutput) -> bool {
        if !has_usable_content(&output.fields) {
            return false;
        }
        let text = combined_content(&item.title, &output.fields);
        output.set_content(text, ContentStrategy::Structured)
    }

    async fn fetch_into(&self, item: &ContentItem, output: &mut AcquisitionOutput) {
        let raw_url = item.url.clone().unwrap_or_default();
        output.diagnostic.attempted = true;
        output.diagnostic.url = Some(raw_url.clone());

        let result = match Url::parse(raw_url.trim()) {
            Ok(url) => self.fetcher.fetch(&url).await,
            Err(e) => Err(AcquisitionError::InvalidUrl(format!("{raw_url}: {e}"))),
        };

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                self.record_failure(item, output, err);
                return;
            }
        };

        output.diagnostic.http_status = Some(page.status);
        if self.settings.debug {
            output.diagnostic.headers = Some(page.headers.clone());
        }

        if item.is_binary() {
            output.diagnostic.succeeded = true;
            return;
        }

        let truncated = page.truncated;
        match self.page_text(item, page) {
            Ok(text) => {
                output.diagnostic.succeeded = true;
                if output.set_content(text, ContentStrategy::Frontend) {
                    output.truncated = truncated;
                }
            }
            Err(err) => self.record_failure(item, output, err),
        }
    }

    /// Turn a fetched page into plain text. Bounding happens once the final text is known.
    fn page_text(&self, item: &ContentItem, page: FetchedPage) -> Result<String, AcquisitionError> {
        let is_html = page.is_html();
        if !is_html && !page.is_plain_text() {
            return Err(AcquisitionError::Body(format!(
                "unsupported content type {}",
                page.content_type.as_deref().unwrap_or_default()
            )));
        }

        let raw = self
            .extensions
            .pre_extract(item, strip_control_chars(&page.body));
        // Character references decode back into control characters.
        Ok(if is_html {
            strip_control_chars(&html_to_text(&raw))
        } else {
            raw
        })
    }

    fn record_failure(
        &self,
        item: &ContentItem,
        output: &mut AcquisitionOutput,
        err: AcquisitionError,
    ) {
        if let AcquisitionError::Http(status) = &err {
            output.diagnostic.http_status = Some(*status);
        }
        if err.is_ssrf() {
            warn!(
                item_id = item.id,
                site_id = item.site_id,
                url = ?output.diagnostic.url,
                code = err.code(),
                error = %err,
                "Frontend fetch blocked by address policy"
            );
        } else {
            warn!(
                item_id = item.id,
                site_id = item.site_id,
                url = ?output.diagnostic.url,
                code = err.code(),
                error = %err,
                "Frontend fetch failed"
            );
        }
        output.diagnostic.succeeded = false;
        output.diagnostic.error = Some(err.to_string());
        output.diagnostic.error_code = Some(err.code().to_string());
    }
}
