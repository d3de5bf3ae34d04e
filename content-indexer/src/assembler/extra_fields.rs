//! Operator-declared extra document fields.

use std::collections::BTreeMap;

use content_indexer_shared::types::fields;
use content_indexer_shared::{guard, ContentItem, ExtensionResult};
use content_indexer_repository::opensearch::is_valid_mapping_hint;
use serde_json::Value;
use tracing::warn;

use crate::errors::PipelineError;

/// Computes an extra field for one item. `Ok(None)` omits the field.
pub type ValueResolver = Box<dyn Fn(&ContentItem) -> ExtensionResult<Option<Value>> + Send + Sync>;

struct ExtraField {
    mapping_hint: Value,
    resolver: ValueResolver,
}

/// Extra fields keyed by name, each a mapping hint plus a value resolver.
#[derive(Default)]
pub struct ExtraFieldRegistry {
    fields: BTreeMap<String, ExtraField>,
}

impl ExtraFieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra field, replacing any earlier one of the same name.
    ///
    /// Core field names and mapping hints without a string `type` are
    /// rejected; the rejection is logged and the registry is left unchanged.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        mapping_hint: Value,
        resolver: impl Fn(&ContentItem) -> ExtensionResult<Option<Value>> + Send + Sync + 'static,
    ) -> Result<(), PipelineError> {
        let name = name.into();
        if fields::is_core(&name) {
            warn!(field = %name, "Extra field cannot replace a core field, skipping");
            return Err(PipelineError::configuration(format!(
                "extra field '{name}' collides with a core field"
            )));
        }
        if !is_valid_mapping_hint(&mapping_hint) {
            warn!(field = %name, hint = %mapping_hint, "Malformed mapping hint, skipping");
            return Err(PipelineError::configuration(format!(
                "extra field '{name}' has a malformed mapping hint"
            )));
        }

        self.fields.insert(
            name,
            ExtraField {
                mapping_hint,
                resolver: Box::new(resolver),
            },
        );
        Ok(())
    }

    /// Builder form of [`register`](Self::register); rejected fields are dropped.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        mapping_hint: Value,
        resolver: impl Fn(&ContentItem) -> ExtensionResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        let _ = self.register(name, mapping_hint, resolver);
        self
    }

    /// Mapping hints for schema generation.
    pub fn mapping_hints(&self) -> BTreeMap<String, Value> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.mapping_hint.clone()))
            .collect()
    }

    /// Resolve every extra field for `item`. Failing resolvers are omitted.
    pub fn resolve(&self, item: &ContentItem) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| {
                let value = guard(name, || (field.resolver)(item)).flatten()?;
                (!value.is_null()).then(|| (name.clone(), value))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use content_indexer_shared::{ItemAttributes, ItemVariant};
    use serde_json::json;

    fn item() -> ContentItem {
        ContentItem {
            id: 3,
            site_id: 1,
            title: "Topic".to_string(),
            slug: Some("topic".to_string()),
            status: "enabled".to_string(),
            url: None,
            date_created: Utc::now(),
            date_updated: Utc::now(),
            enabled: true,
            archived: false,
            variant: ItemVariant::Canonical,
            attributes: ItemAttributes::Category {
                group: "topics".to_string(),
                level: 2,
                lft: 3,
                rgt: 4,
            },
        }
    }

    #[test]
    fn test_register_rejects_core_and_malformed() {
        let mut registry = ExtraFieldRegistry::new();
        assert!(registry
            .register("title", json!({"type": "text"}), |_| Ok(None))
            .is_err());
        assert!(registry
            .register("color", json!({"analyzer": "english"}), |_| Ok(None))
            .is_err());
        assert!(registry
            .register("color", json!("keyword"), |_| Ok(None))
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_omits_failures() {
        let registry = ExtraFieldRegistry::new()
            .with_field("color", json!({"type": "keyword"}), |_| Ok(Some(json!("blue"))))
            .with_field("broken", json!({"type": "keyword"}), |_| Err("lookup failed".into()))
            .with_field("panics", json!({"type": "keyword"}), |_| panic!("resolver bug"))
            .with_field("absent", json!({"type": "keyword"}), |_| Ok(None))
            .with_field("title_len", json!({"type": "integer"}), |item| {
                Ok(Some(json!(item.title.len())))
            });

        let resolved = registry.resolve(&item());
        assert_eq!(
            resolved,
            vec![
                ("color".to_string(), json!("blue")),
                ("title_len".to_string(), json!(5)),
            ]
        );
        assert_eq!(registry.mapping_hints().len(), 5);
    }
}
