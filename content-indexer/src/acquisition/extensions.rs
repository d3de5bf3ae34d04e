//! Operator extensions around content acquisition.
//!
//! Every extension runs through [`guard`]: a failing or panicking extension
//! leaves the default result in place.

use content_indexer_shared::{guard, ContentItem, ExtensionResult};

/// Supplies content for an item, bypassing both strategies when it returns `Some`.
pub type ContentOverride =
    Box<dyn Fn(&ContentItem) -> ExtensionResult<Option<String>> + Send + Sync>;

/// Sees the raw fetched body before text extraction and may replace it.
pub type PreExtractionHook =
    Box<dyn Fn(&ContentItem, &str) -> ExtensionResult<Option<String>> + Send + Sync>;

/// Sees the acquired text and returns the text to keep.
pub type PostExtractionHook =
    Box<dyn Fn(&ContentItem, &str) -> ExtensionResult<String> + Send + Sync>;

#[derive(Default)]
pub struct AcquisitionExtensions {
    content_override: Option<(String, ContentOverride)>,
    pre_extraction: Vec<(String, PreExtractionHook)>,
    post_extraction: Vec<(String, PostExtractionHook)>,
}

impl AcquisitionExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_override(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&ContentItem) -> ExtensionResult<Option<String>> + Send + Sync + 'static,
    ) -> Self {
        self.content_override = Some((name.into(), Box::new(f)));
        self
    }

    pub fn with_pre_extraction(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&ContentItem, &str) -> ExtensionResult<Option<String>> + Send + Sync + 'static,
    ) -> Self {
        self.pre_extraction.push((name.into(), Box::new(f)));
        self
    }

    pub fn with_post_extraction(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&ContentItem, &str) -> ExtensionResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.post_extraction.push((name.into(), Box::new(f)));
        self
    }

    /// Content from the override, if one is registered and produced text.
    pub fn override_content(&self, item: &ContentItem) -> Option<String> {
        let (name, f) = self.content_override.as_ref()?;
        guard(name, || f(item)).flatten()
    }

    /// Run the pre-extraction hooks in order over the raw body.
    pub fn pre_extract(&self, item: &ContentItem, raw: String) -> String {
        self.pre_extraction.iter().fold(raw, |current, (name, f)| {
            guard(name, || f(item, &current)).flatten().unwrap_or(current)
        })
    }

    /// Run the post-extraction hooks in order over the acquired text.
    pub fn post_extract(&self, item: &ContentItem, text: String) -> String {
        self.post_extraction.iter().fold(text, |current, (name, f)| {
            guard(name, || f(item, &current)).unwrap_or(current)
        })
    }
}
