//! Document types for the search index.
//!
//! This module defines the flattened field map that is stored in the search
//! engine for one content item in one site.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the field that carries acquired text content.
pub const CONTENT_FIELD: &str = "content";

/// Document representation for the search index.
///
/// A document is rebuilt for every indexing attempt and fully replaces any
/// previously stored version under the same id. The `content` field is only
/// present when acquisition produced non-empty text, so its absence is
/// meaningful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Document {
    #[serde(skip)]
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Document {
    /// Create an empty document for the given item and site.
    ///
    /// # Example
    ///
    /// ```
    /// use content_indexer_shared::Document;
    ///
    /// let mut doc = Document::new(12, 1);
    /// doc.insert("title", "Hello World");
    /// assert_eq!(doc.id(), "12_1");
    /// ```
    pub fn new(item_id: u64, site_id: u64) -> Self {
        Self {
            id: Self::document_id(item_id, site_id),
            fields: Map::new(),
        }
    }

    /// Generate the document ID used in the search index.
    ///
    /// The document ID is a combination of item id and site id so that the
    /// same item stored for two sites never collides.
    pub fn document_id(item_id: u64, site_id: u64) -> String {
        format!("{}_{}", item_id, site_id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Set a field only when a value is present.
    pub fn insert_opt<V: Into<Value>>(&mut self, name: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// The acquired text content, if any.
    pub fn content(&self) -> Option<&str> {
        self.fields.get(CONTENT_FIELD).and_then(Value::as_str)
    }

    /// The field map sent to the search engine.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
