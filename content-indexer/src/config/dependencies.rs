//! Dependency initialization and wiring for the content indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use content_indexer_repository::{
    BasicAuth, IndexManager, OpenSearchProvider, SearchIndexProvider, SearchIndexService,
};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::acquisition::{AcquisitionEngine, HttpPageFetcher};
use crate::assembler::{DocumentAssembler, ExtraFieldRegistry};
use crate::config::IndexerSettings;
use crate::orchestrator::Orchestrator;
use crate::source::{ContentSource, SnapshotContentSource};
use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection at a fixed interval until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from `OPENSEARCH_CONNECTION_MODE`.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// What the binary should do once wired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    /// Sites to reindex. Empty means every site of the content source.
    pub sites: Vec<u64>,
    /// Recreate indexes before reindexing.
    pub reset: bool,
}

impl RunPlan {
    fn from_env() -> Result<Self, IndexingError> {
        let sites = match env::var("REINDEX_SITES") {
            Ok(raw) => parse_site_list(&raw)?,
            Err(_) => Vec::new(),
        };
        Ok(Self {
            sites,
            reset: env_flag("REINDEX_RESET").unwrap_or(false),
        })
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// Content source shared with the orchestrator, used to list sites.
    pub source: Arc<dyn ContentSource>,
    pub plan: RunPlan,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: basic auth credentials (optional)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: retry interval in seconds (default: 15)
    /// - `INDEXER_SETTINGS_PATH`: JSON settings file (default: built-in settings)
    /// - `INDEXER_DEBUG`: overrides the `debug` setting
    /// - `CONTENT_SNAPSHOT_PATH`: JSON content export to index
    /// - `REINDEX_SITES`: comma-separated site ids (default: every site)
    /// - `REINDEX_RESET`: recreate indexes before reindexing (default: false)
    pub async fn new() -> Result<Self, IndexingError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let auth = match (env::var("OPENSEARCH_USERNAME"), env::var("OPENSEARCH_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(BasicAuth { username, password }),
            _ => None,
        };
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let plan = RunPlan::from_env()?;

        info!(
            opensearch_url = %opensearch_url,
            basic_auth = auth.is_some(),
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            "Initializing dependencies"
        );

        let settings = Arc::new(Self::load_settings()?);
        let source = Self::load_source()?;

        let search_provider = Self::connect_to_opensearch(
            &opensearch_url,
            auth,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;
        info!("OpenSearch connection established");
        let provider: Arc<dyn SearchIndexProvider> = Arc::new(search_provider);

        let fetcher = HttpPageFetcher::new(&settings.fetch)
            .map_err(|e| IndexingError::config(format!("Failed to create page fetcher: {}", e)))?;
        let acquisition =
            AcquisitionEngine::new(settings.clone(), source.clone(), Arc::new(fetcher));

        let assembler = DocumentAssembler::new(ExtraFieldRegistry::new());
        let schema = settings.schema_config(assembler.extra_fields().mapping_hints());
        let indexes = IndexManager::new(provider.clone(), schema);
        let store = SearchIndexService::new(provider);

        let orchestrator = Orchestrator::new(
            settings,
            source.clone(),
            acquisition,
            assembler,
            indexes,
            store,
        );

        Ok(Self {
            orchestrator,
            source,
            plan,
        })
    }

    fn load_settings() -> Result<IndexerSettings, IndexingError> {
        let mut settings = match env::var("INDEXER_SETTINGS_PATH") {
            Ok(path) => {
                info!(path = %path, "Loading indexer settings");
                IndexerSettings::from_path(&path)
                    .map_err(|e| IndexingError::config(format!("Invalid indexer settings: {}", e)))?
            }
            Err(_) => IndexerSettings::default(),
        };
        if let Some(debug) = env_flag("INDEXER_DEBUG") {
            settings.debug = debug;
        }
        Ok(settings)
    }

    fn load_source() -> Result<Arc<dyn ContentSource>, IndexingError> {
        let path = env::var("CONTENT_SNAPSHOT_PATH").map_err(|_| {
            IndexingError::config("CONTENT_SNAPSHOT_PATH must point to a content export")
        })?;
        let source = SnapshotContentSource::from_path(&path)
            .map_err(|e| IndexingError::config(format!("Failed to load content snapshot: {}", e)))?;
        Ok(Arc::new(source))
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        auth: Option<BasicAuth>,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match Self::try_connect_opensearch(url, auth.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Build the provider and check that the cluster answers.
    async fn try_connect_opensearch(
        url: &str,
        auth: Option<BasicAuth>,
    ) -> Result<OpenSearchProvider, IndexingError> {
        let search_provider = OpenSearchProvider::new(url, auth).await.map_err(|e| {
            IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
        })?;
        search_provider
            .ping()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch did not answer: {}", e)))?;

        Ok(search_provider)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => {
            warn!(variable = name, value = %raw, "Invalid boolean, ignoring");
            None
        }
    }
}

fn parse_site_list(raw: &str) -> Result<Vec<u64>, IndexingError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u64>().map_err(|_| {
                IndexingError::config(format!("Invalid site id in REINDEX_SITES: {part}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_site_list() {
        assert_eq!(parse_site_list("1, 2,,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_site_list("").unwrap().is_empty());
        assert!(parse_site_list("1,two").is_err());
    }
}
