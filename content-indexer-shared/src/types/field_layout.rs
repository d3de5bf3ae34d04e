//! Field layout trees.
//!
//! A layout is stored as an arena of [`FieldNode`]s with parent/child indices.
//! Nodes can only be appended under an existing parent, so a layout is always
//! a tree: walks over it terminate without cycle detection.

use serde::{Deserialize, Serialize};

/// Target of a relation field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Entries,
    Assets,
    Categories,
    Tags,
    Users,
    Products,
}

/// Field types understood by structured extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    PlainText,
    RichText,
    Number,
    Lightswitch,
    Email,
    Url,
    /// Dropdown, radio buttons, checkboxes, multi-select.
    Options,
    Date,
    Time,
    Money,
    Country,
    Table,
    Relation(RelationKind),
    /// Block/repeater field whose sub-fields are the node's children.
    Blocks,
    Other(String),
}

impl FieldType {
    /// Stable identifier reported in extracted fields.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::PlainText => "plain_text",
            FieldType::RichText => "rich_text",
            FieldType::Number => "number",
            FieldType::Lightswitch => "lightswitch",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Options => "options",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Money => "money",
            FieldType::Country => "country",
            FieldType::Table => "table",
            FieldType::Relation(_) => "relation",
            FieldType::Blocks => "blocks",
            FieldType::Other(name) => name.as_str(),
        }
    }
}

/// A single field descriptor in a layout arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    pub handle: String,
    pub field_type: FieldType,
    pub searchable: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Nested form of a field, used to (de)serialize layouts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub handle: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub children: Vec<FieldSpec>,
}

/// The field layout of a content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FieldLayout {
    nodes: Vec<FieldNode>,
}

impl FieldLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level field and return its index.
    pub fn add_field(
        &mut self,
        handle: impl Into<String>,
        field_type: FieldType,
        searchable: bool,
    ) -> usize {
        self.push(None, handle.into(), field_type, searchable)
    }

    /// Append a sub-field under `parent` and return its index.
    ///
    /// Returns `None` if `parent` does not exist.
    pub fn add_child(
        &mut self,
        parent: usize,
        handle: impl Into<String>,
        field_type: FieldType,
        searchable: bool,
    ) -> Option<usize> {
        if parent >= self.nodes.len() {
            return None;
        }
        let index = self.push(Some(parent), handle.into(), field_type, searchable);
        self.nodes[parent].children.push(index);
        Some(index)
    }

    fn push(
        &mut self,
        parent: Option<usize>,
        handle: String,
        field_type: FieldType,
        searchable: bool,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(FieldNode {
            handle,
            field_type,
            searchable,
            parent,
            children: Vec::new(),
        });
        index
    }

    pub fn node(&self, index: usize) -> Option<&FieldNode> {
        self.nodes.get(index)
    }

    /// Indices of the top-level fields, in layout order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
    }

    /// Indices of the direct children of `index`, in layout order.
    pub fn children(&self, index: usize) -> &[usize] {
        self.nodes
            .get(index)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Depth of the deepest node (a flat layout has depth 1, an empty one 0).
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max = 0;
        // Parents are always appended before their children.
        for (index, node) in self.nodes.iter().enumerate() {
            let depth = node.parent.map(|parent| depths[parent] + 1).unwrap_or(1);
            depths[index] = depth;
            max = max.max(depth);
        }
        max
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn append_spec(&mut self, parent: Option<usize>, spec: FieldSpec) {
        let index = match parent {
            Some(parent) => {
                match self.add_child(parent, spec.handle, spec.field_type, spec.searchable) {
                    Some(index) => index,
                    None => return,
                }
            }
            None => self.add_field(spec.handle, spec.field_type, spec.searchable),
        };
        for child in spec.children {
            self.append_spec(Some(index), child);
        }
    }

    fn spec_of(&self, index: usize) -> FieldSpec {
        let node = &self.nodes[index];
        FieldSpec {
            handle: node.handle.clone(),
            field_type: node.field_type.clone(),
            searchable: node.searchable,
            children: node.children.iter().map(|&c| self.spec_of(c)).collect(),
        }
    }
}

impl From<Vec<FieldSpec>> for FieldLayout {
    fn from(specs: Vec<FieldSpec>) -> Self {
        let mut layout = FieldLayout::new();
        for spec in specs {
            layout.append_spec(None, spec);
        }
        layout
    }
}

impl From<FieldLayout> for Vec<FieldSpec> {
    fn from(layout: FieldLayout) -> Self {
        layout.roots().map(|index| layout.spec_of(index)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> FieldLayout {
        let mut layout = FieldLayout::new();
        layout.add_field("summary", FieldType::PlainText, true);
        let blocks = layout.add_field("body", FieldType::Blocks, true);
        layout
            .add_child(blocks, "heading", FieldType::PlainText, true)
            .unwrap();
        layout
            .add_child(blocks, "internalNote", FieldType::PlainText, false)
            .unwrap();
        layout
    }

    #[test]
    fn test_roots_and_children_keep_order() {
        let layout = sample_layout();
        let roots: Vec<_> = layout.roots().collect();
        assert_eq!(roots, vec![0, 1]);
        assert_eq!(layout.children(1), &[2, 3]);
        assert_eq!(layout.node(2).unwrap().parent, Some(1));
        assert!(layout.children(0).is_empty());
    }

    #[test]
    fn test_add_child_to_missing_parent() {
        let mut layout = FieldLayout::new();
        assert!(layout
            .add_child(5, "orphan", FieldType::PlainText, true)
            .is_none());
        assert!(layout.is_empty());
    }

    #[test]
    fn test_depth() {
        assert_eq!(FieldLayout::new().depth(), 0);
        let mut layout = sample_layout();
        assert_eq!(layout.depth(), 2);
        let nested = layout.add_child(1, "gallery", FieldType::Blocks, true).unwrap();
        layout
            .add_child(nested, "caption", FieldType::PlainText, true)
            .unwrap();
        assert_eq!(layout.depth(), 3);
    }

    #[test]
    fn test_nested_json_form() {
        let json = r#"[
            { "handle": "summary", "field_type": "plain_text", "searchable": true },
            { "handle": "related", "field_type": { "relation": "entries" }, "searchable": true },
            { "handle": "body", "field_type": "blocks", "searchable": true, "children": [
                { "handle": "text", "field_type": "rich_text", "searchable": true }
            ] }
        ]"#;
        let layout: FieldLayout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.len(), 4);
        assert_eq!(
            layout.node(1).unwrap().field_type,
            FieldType::Relation(RelationKind::Entries)
        );
        assert_eq!(layout.children(2), &[3]);

        let back = serde_json::to_value(&layout).unwrap();
        assert_eq!(back[2]["children"][0]["handle"], "text");
    }
}
