//! Index naming and schema configuration.
//!
//! Index identity is a pure function of configuration and site id:
//! `prefix + (type-specific suffix OR fallback suffix) + "_" + site_id`.

use std::collections::{BTreeMap, BTreeSet};

use content_indexer_shared::ItemKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::utils::validate_index_name;

/// Naming scheme for per-site (optionally per-type) indexes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexNaming {
    /// Prefix shared by every index of the deployment.
    pub prefix: String,
    /// Suffix used by kinds without a type-specific suffix.
    pub fallback_suffix: String,
    /// Kinds routed to their own index.
    pub type_suffixes: BTreeMap<ItemKind, String>,
}

impl Default for IndexNaming {
    fn default() -> Self {
        Self {
            prefix: "cms_".to_string(),
            fallback_suffix: "content".to_string(),
            type_suffixes: BTreeMap::new(),
        }
    }
}

impl IndexNaming {
    /// Name of the index holding items of `kind` for `site_id`.
    pub fn index_name(&self, kind: ItemKind, site_id: u64) -> String {
        let suffix = self
            .type_suffixes
            .get(&kind)
            .map(String::as_str)
            .unwrap_or(&self.fallback_suffix);
        format!("{}{}_{}", self.prefix, suffix, site_id)
    }

    /// Name of the fallback index for `site_id`.
    pub fn fallback_index_name(&self, site_id: u64) -> String {
        format!("{}{}_{}", self.prefix, self.fallback_suffix, site_id)
    }

    /// Distinct index names used by `kinds` on `site_id`, sorted.
    ///
    /// The fallback index is always included.
    pub fn site_index_names(
        &self,
        kinds: impl IntoIterator<Item = ItemKind>,
        site_id: u64,
    ) -> Vec<String> {
        let mut names: BTreeSet<String> = kinds
            .into_iter()
            .map(|kind| self.index_name(kind, site_id))
            .collect();
        names.insert(self.fallback_index_name(site_id));
        names.into_iter().collect()
    }

    /// Validate that every name this scheme can produce is a legal index name.
    pub fn validate(&self) -> Result<(), SearchIndexError> {
        validate_index_name(&self.fallback_index_name(1))?;
        for kind in self.type_suffixes.keys() {
            validate_index_name(&self.index_name(*kind, 1))?;
        }
        Ok(())
    }
}

/// Inputs for mapping generation.
///
/// Only the field groups of enabled kinds are mapped, so an index never
/// carries fields for content it cannot receive.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    pub naming: IndexNaming,
    pub enabled_kinds: BTreeSet<ItemKind>,
    /// Operator-declared extra fields: name -> mapping hint.
    pub extra_fields: BTreeMap<String, Value>,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            naming: IndexNaming::default(),
            enabled_kinds: ItemKind::ALL.into_iter().collect(),
            extra_fields: BTreeMap::new(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl SchemaConfig {
    /// Enabled kinds stored in `index_name` for `site_id`.
    pub fn kinds_in_index(&self, index_name: &str, site_id: u64) -> BTreeSet<ItemKind> {
        self.enabled_kinds
            .iter()
            .copied()
            .filter(|kind| self.naming.index_name(*kind, site_id) == index_name)
            .collect()
    }

    /// Every index name used on `site_id`.
    pub fn site_index_names(&self, site_id: u64) -> Vec<String> {
        self.naming
            .site_index_names(self.enabled_kinds.iter().copied(), site_id)
    }
}
