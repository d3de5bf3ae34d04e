//! Indexer settings.
//!
//! Settings are loaded once (from a JSON file or defaults) and handed to the
//! components that need them. Every field has a default, so a partial file is
//! enough to override a few values.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use content_indexer_repository::{IndexNaming, SchemaConfig};
use content_indexer_shared::ItemKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default frontend fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
/// Default number of redirects followed by the frontend fetch.
pub const DEFAULT_MAX_REDIRECTS: usize = 3;
/// Default response size cap for the frontend fetch.
pub const DEFAULT_MAX_BYTES: usize = 100 * 1024;
/// Default number of items indexed concurrently by a bulk reindex.
pub const DEFAULT_BULK_CONCURRENCY: usize = 4;

const DEFAULT_USER_AGENT: &str = concat!("content-indexer/", env!("CARGO_PKG_VERSION"));

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Index naming and shard layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexSettings {
    #[serde(flatten)]
    pub naming: IndexNaming,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            naming: IndexNaming::default(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntrySettings {
    pub enabled: bool,
    pub excluded_sections: Vec<String>,
    pub excluded_entry_types: Vec<String>,
    /// Allowed statuses. Empty allows every status.
    pub statuses: Vec<String>,
    pub frontend_fetch: bool,
}

impl Default for EntrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_sections: Vec::new(),
            excluded_entry_types: Vec::new(),
            statuses: strings(&["live", "pending"]),
            frontend_fetch: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetSettings {
    pub enabled: bool,
    pub excluded_volumes: Vec<String>,
    pub excluded_kinds: Vec<String>,
    pub statuses: Vec<String>,
    pub frontend_fetch: bool,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_volumes: Vec::new(),
            excluded_kinds: Vec::new(),
            statuses: Vec::new(),
            frontend_fetch: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategorySettings {
    pub enabled: bool,
    pub excluded_groups: Vec<String>,
    pub statuses: Vec<String>,
    pub frontend_fetch: bool,
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_groups: Vec::new(),
            statuses: strings(&["enabled"]),
            frontend_fetch: false,
        }
    }
}

/// Settings for products and digital products.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommerceSettings {
    pub enabled: bool,
    pub excluded_product_types: Vec<String>,
    pub statuses: Vec<String>,
    pub frontend_fetch: bool,
}

impl Default for CommerceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_product_types: Vec::new(),
            statuses: strings(&["live"]),
            frontend_fetch: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub max_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_bytes: DEFAULT_MAX_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BulkSettings {
    pub concurrency: usize,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BULK_CONCURRENCY,
        }
    }
}

/// Complete indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexerSettings {
    pub index: IndexSettings,
    /// Skip items without a public URL unless their kind is exempt.
    pub require_public_url: bool,
    pub url_exempt_kinds: BTreeSet<ItemKind>,
    pub prefer_structured_fields: bool,
    pub fallback_to_frontend_fetch: bool,
    /// Field handles extracted even when the layout does not mark them searchable.
    pub forced_searchable_fields: BTreeSet<String>,
    /// Attach response headers to acquisition diagnostics.
    pub debug: bool,
    pub entries: EntrySettings,
    pub assets: AssetSettings,
    pub categories: CategorySettings,
    pub products: CommerceSettings,
    pub digital_products: CommerceSettings,
    pub fetch: FetchSettings,
    pub bulk: BulkSettings,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            index: IndexSettings::default(),
            require_public_url: true,
            url_exempt_kinds: BTreeSet::from([ItemKind::Asset]),
            prefer_structured_fields: true,
            fallback_to_frontend_fetch: true,
            forced_searchable_fields: BTreeSet::new(),
            debug: false,
            entries: EntrySettings::default(),
            assets: AssetSettings::default(),
            categories: CategorySettings::default(),
            products: CommerceSettings::default(),
            digital_products: CommerceSettings::default(),
            fetch: FetchSettings::default(),
            bulk: BulkSettings::default(),
        }
    }
}

impl IndexerSettings {
    /// Load and validate settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// Parse and validate settings from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(raw).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.bulk.concurrency == 0 {
            return Err(SettingsError::Invalid(
                "bulk.concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "fetch.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.fetch.max_bytes == 0 {
            return Err(SettingsError::Invalid(
                "fetch.max_bytes must be at least 1".to_string(),
            ));
        }
        self.index
            .naming
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("index naming: {}", e)))?;
        Ok(())
    }

    pub fn kind_enabled(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Entry => self.entries.enabled,
            ItemKind::Asset => self.assets.enabled,
            ItemKind::Category => self.categories.enabled,
            ItemKind::Product => self.products.enabled,
            ItemKind::DigitalProduct => self.digital_products.enabled,
        }
    }

    pub fn enabled_kinds(&self) -> BTreeSet<ItemKind> {
        ItemKind::ALL
            .into_iter()
            .filter(|kind| self.kind_enabled(*kind))
            .collect()
    }

    /// Status allow-list of `kind`. Empty allows every status.
    pub fn statuses(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Entry => &self.entries.statuses,
            ItemKind::Asset => &self.assets.statuses,
            ItemKind::Category => &self.categories.statuses,
            ItemKind::Product => &self.products.statuses,
            ItemKind::DigitalProduct => &self.digital_products.statuses,
        }
    }

    /// Whether the frontend fetch may run for items of `kind`.
    pub fn frontend_fetch(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Entry => self.entries.frontend_fetch,
            ItemKind::Asset => self.assets.frontend_fetch,
            ItemKind::Category => self.categories.frontend_fetch,
            ItemKind::Product => self.products.frontend_fetch,
            ItemKind::DigitalProduct => self.digital_products.frontend_fetch,
        }
    }

    /// Schema inputs for the index manager.
    pub fn schema_config(&self, extra_fields: BTreeMap<String, Value>) -> SchemaConfig {
        SchemaConfig {
            naming: self.index.naming.clone(),
            enabled_kinds: self.enabled_kinds(),
            extra_fields,
            number_of_shards: self.index.number_of_shards,
            number_of_replicas: self.index.number_of_replicas,
        }
    }
}
