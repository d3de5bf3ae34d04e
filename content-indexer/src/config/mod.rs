//! Configuration for the content indexer.
//!
//! [`settings`] holds the pipeline settings loaded from JSON;
//! [`dependencies`] wires every component from the environment.

pub mod dependencies;
pub mod settings;

pub use dependencies::{ConnectionMode, Dependencies, RunPlan};
pub use settings::{
    AssetSettings, BulkSettings, CategorySettings, CommerceSettings, EntrySettings,
    FetchSettings, IndexSettings, IndexerSettings, SettingsError,
};
