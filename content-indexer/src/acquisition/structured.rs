//! Structured field extraction.
//!
//! Walks a field layout in order and turns every searchable (or forced) field
//! into an [`ExtractedField`]. Block fields recurse only into their own
//! searchable sub-fields, never deeper than the layout itself.

use std::collections::{BTreeMap, BTreeSet};

use content_indexer_shared::{FieldLayout, FieldType, FieldValue};
use serde_json::{Map, Value};

use crate::acquisition::transforms::{join_non_empty, transform, Transformed};

/// One extracted field.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedField {
    pub handle: String,
    pub value: Value,
    pub keywords: String,
    pub field_type: FieldType,
    pub structured_type: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct StructuredExtractor {
    forced: BTreeSet<String>,
}

impl StructuredExtractor {
    /// `forced` lists handles extracted even when not marked searchable.
    pub fn new(forced: BTreeSet<String>) -> Self {
        Self { forced }
    }

    /// Extract the top-level fields of `layout`, reading raw values from `value_of`.
    pub fn extract(
        &self,
        layout: &FieldLayout,
        value_of: impl Fn(&str) -> Option<FieldValue>,
    ) -> Vec<ExtractedField> {
        let max_depth = layout.depth();
        layout
            .roots()
            .filter_map(|index| {
                let node = layout.node(index)?;
                if !self.is_indexed(node.searchable, &node.handle) {
                    return None;
                }
                let raw = value_of(&node.handle)?;
                let transformed = self.field(layout, index, &raw, 1, max_depth)?;
                Some(ExtractedField {
                    handle: node.handle.clone(),
                    value: transformed.value,
                    keywords: transformed.keywords,
                    field_type: node.field_type.clone(),
                    structured_type: transformed.structured_type,
                })
            })
            .collect()
    }

    fn is_indexed(&self, searchable: bool, handle: &str) -> bool {
        searchable || self.forced.contains(handle)
    }

    fn field(
        &self,
        layout: &FieldLayout,
        index: usize,
        raw: &FieldValue,
        depth: usize,
        max_depth: usize,
    ) -> Option<Transformed> {
        let node = layout.node(index)?;
        match raw {
            FieldValue::Blocks(blocks) => self.blocks(layout, index, blocks, depth, max_depth),
            other => transform(&node.field_type, other),
        }
    }

    fn blocks(
        &self,
        layout: &FieldLayout,
        index: usize,
        blocks: &[BTreeMap<String, FieldValue>],
        depth: usize,
        max_depth: usize,
    ) -> Option<Transformed> {
        if depth >= max_depth {
            return None;
        }

        let mut values = Vec::new();
        let mut keywords = Vec::new();

        for block in blocks {
            let mut block_value = Map::new();
            for &child in layout.children(index) {
                let Some(child_node) = layout.node(child) else {
                    continue;
                };
                if !self.is_indexed(child_node.searchable, &child_node.handle) {
                    continue;
                }
                let Some(raw) = block.get(&child_node.handle) else {
                    continue;
                };
                if let Some(transformed) = self.field(layout, child, raw, depth + 1, max_depth) {
                    if !transformed.keywords.is_empty() {
                        keywords.push(transformed.keywords);
                    }
                    block_value.insert(child_node.handle.clone(), transformed.value);
                }
            }
            if !block_value.is_empty() {
                values.push(Value::Object(block_value));
            }
        }

        if values.is_empty() {
            return None;
        }
        Some(Transformed {
            value: Value::Array(values),
            keywords: keywords.join("\n"),
            structured_type: Some("blocks"),
        })
    }
}

/// Title followed by every non-empty keyword string, one per line, in layout order.
pub fn combined_content(title: &str, fields: &[ExtractedField]) -> String {
    join_non_empty(
        std::iter::once(title).chain(fields.iter().map(|field| field.keywords.as_str())),
        "\n",
    )
}

/// True when at least one field produced text.
pub fn has_usable_content(fields: &[ExtractedField]) -> bool {
    fields.iter().any(|field| !field.keywords.is_empty())
}
