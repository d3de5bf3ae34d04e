//! OpenSearch index settings and mappings.
//!
//! The schema is derived from [`SchemaConfig`] every time an index is created;
//! nothing here is cached between calls.

use std::collections::{BTreeMap, BTreeSet};

use content_indexer_shared::types::fields;
use content_indexer_shared::{ItemKind, SiteInfo};
use serde_json::{json, Value};
use tracing::warn;

use crate::config::SchemaConfig;

/// Analyzer used when a site language has no language-specific analyzer.
pub const DEFAULT_ANALYZER: &str = "standard";

/// Map a language tag ("en", "en-US", "pt_BR") to a built-in analyzer name.
pub fn analyzer_for_language(language: &str) -> &'static str {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match primary.as_str() {
        "en" => "english",
        "fr" => "french",
        "de" => "german",
        "es" => "spanish",
        "it" => "italian",
        "pt" => "portuguese",
        "nl" => "dutch",
        "sv" => "swedish",
        "da" => "danish",
        "nb" | "nn" | "no" => "norwegian",
        "fi" => "finnish",
        "ru" => "russian",
        "ar" => "arabic",
        "tr" => "turkish",
        "ja" | "zh" | "ko" => "cjk",
        _ => DEFAULT_ANALYZER,
    }
}

/// Field → mapping structure for one index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    pub index_name: String,
    pub analyzer: &'static str,
    pub properties: BTreeMap<String, Value>,
    number_of_shards: u32,
    number_of_replicas: u32,
}

impl IndexSchema {
    /// Build the schema for `index_name` on `site`.
    ///
    /// Only field groups of enabled kinds routed to this index are mapped.
    /// Extra-field hints that are not an object with a string `type`, or that
    /// name a core field, are skipped with a warning.
    pub fn build(config: &SchemaConfig, site: &SiteInfo, index_name: &str) -> Self {
        let analyzer = analyzer_for_language(&site.language);
        if analyzer == DEFAULT_ANALYZER && !site.language.is_empty() {
            warn!(
                site_id = site.id,
                language = %site.language,
                "No language analyzer for site, using standard"
            );
        }

        let kinds = config.kinds_in_index(index_name, site.id);
        let mut properties = core_properties(analyzer);
        add_kind_groups(&mut properties, &kinds);

        for (name, hint) in &config.extra_fields {
            if fields::is_core(name) {
                warn!(field = %name, "Extra field cannot override a core field, skipping");
                continue;
            }
            if !is_valid_mapping_hint(hint) {
                warn!(field = %name, hint = %hint, "Malformed mapping hint, skipping");
                continue;
            }
            properties.insert(name.clone(), hint.clone());
        }

        Self {
            index_name: index_name.to_string(),
            analyzer,
            properties,
            number_of_shards: config.number_of_shards,
            number_of_replicas: config.number_of_replicas,
        }
    }

    /// Body for the create-index request.
    pub fn to_body(&self) -> Value {
        self.body_with(self.mappings())
    }

    /// Create-index body using `mappings` in place of the generated ones.
    pub fn body_with(&self, mappings: Value) -> Value {
        json!({
            "settings": self.settings(),
            "mappings": mappings
        })
    }

    pub fn settings(&self) -> Value {
        json!({
            "number_of_shards": self.number_of_shards,
            "number_of_replicas": self.number_of_replicas
        })
    }

    pub fn mappings(&self) -> Value {
        json!({ "properties": self.properties })
    }
}

/// A mapping hint is usable when it is an object carrying a string `type`.
pub fn is_valid_mapping_hint(hint: &Value) -> bool {
    hint.get("type").and_then(Value::as_str).is_some()
}

fn keyword() -> Value {
    json!({ "type": "keyword" })
}

fn core_properties(analyzer: &str) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();
    properties.insert(fields::ID.to_string(), json!({ "type": "long" }));
    properties.insert(fields::SITE_ID.to_string(), json!({ "type": "long" }));
    properties.insert(fields::TYPE.to_string(), keyword());
    properties.insert(
        fields::TITLE.to_string(),
        json!({
            "type": "text",
            "analyzer": analyzer,
            "fields": {
                "raw": { "type": "keyword" }
            }
        }),
    );
    properties.insert(fields::SLUG.to_string(), keyword());
    properties.insert(fields::STATUS.to_string(), keyword());
    properties.insert(
        fields::URL.to_string(),
        json!({ "type": "keyword", "index": false }),
    );
    properties.insert(fields::DATE_CREATED.to_string(), json!({ "type": "date" }));
    properties.insert(fields::DATE_UPDATED.to_string(), json!({ "type": "date" }));
    properties.insert(fields::INDEXED_AT.to_string(), json!({ "type": "date" }));
    properties.insert(fields::ENABLED.to_string(), json!({ "type": "boolean" }));
    properties.insert(fields::ARCHIVED.to_string(), json!({ "type": "boolean" }));
    properties.insert(
        fields::CONTENT.to_string(),
        json!({ "type": "text", "analyzer": analyzer }),
    );
    properties
}

fn add_kind_groups(properties: &mut BTreeMap<String, Value>, kinds: &BTreeSet<ItemKind>) {
    if kinds.contains(&ItemKind::Entry) {
        properties.insert(fields::SECTION.to_string(), keyword());
        properties.insert(fields::ENTRY_TYPE.to_string(), keyword());
        properties.insert(fields::POST_DATE.to_string(), json!({ "type": "date" }));
        properties.insert(fields::EXPIRY_DATE.to_string(), json!({ "type": "date" }));
    }

    if kinds.contains(&ItemKind::Asset) {
        properties.insert(fields::VOLUME.to_string(), keyword());
        properties.insert(fields::FILENAME.to_string(), keyword());
        properties.insert(fields::KIND.to_string(), keyword());
        properties.insert(fields::SIZE.to_string(), json!({ "type": "long" }));
        properties.insert(fields::WIDTH.to_string(), json!({ "type": "integer" }));
        properties.insert(fields::HEIGHT.to_string(), json!({ "type": "integer" }));
    }

    if kinds.contains(&ItemKind::Category) {
        properties.insert(fields::GROUP.to_string(), keyword());
        properties.insert(fields::LEVEL.to_string(), json!({ "type": "integer" }));
        properties.insert(fields::LEFT.to_string(), json!({ "type": "integer" }));
        properties.insert(fields::RIGHT.to_string(), json!({ "type": "integer" }));
    }

    if kinds.iter().any(ItemKind::is_commerce) {
        properties.insert(fields::PRODUCT_TYPE.to_string(), keyword());
        properties.insert(
            fields::PRICE.to_string(),
            json!({ "type": "scaled_float", "scaling_factor": 100 }),
        );
        properties.insert(
            fields::SALE_PRICE.to_string(),
            json!({ "type": "scaled_float", "scaling_factor": 100 }),
        );
        properties.insert(fields::SKU.to_string(), keyword());
        properties.insert(fields::STOCK.to_string(), json!({ "type": "integer" }));
        properties.insert(fields::WEIGHT.to_string(), json!({ "type": "float" }));
    }
}
