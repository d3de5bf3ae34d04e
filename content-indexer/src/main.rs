//! Content Indexer Main Entry Point
//!
//! Loads a content export, makes sure each site's indexes exist and reindexes
//! every item, printing per-status tallies. Exits with 1 if any item failed.

use std::env;
use std::process::ExitCode;

use content_indexer::outcome::BulkReindexSummary;
use content_indexer::{BulkOptions, CancellationFlag, Dependencies, IndexingError};
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("content_indexer=info,content_indexer_repository=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "content-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "content-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting Content Indexer");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing in-flight items");
                cancel.cancel();
            }
        });
    }

    let sites = if deps.plan.sites.is_empty() {
        deps.source.sites().into_iter().map(|site| site.id).collect()
    } else {
        deps.plan.sites.clone()
    };

    let mut total = BulkReindexSummary::default();
    let mut site_errors = 0usize;
    for site_id in sites {
        if cancel.is_cancelled() {
            break;
        }
        let options = BulkOptions {
            reset: deps.plan.reset,
            ..BulkOptions::default()
        };
        match deps.orchestrator.reindex_site(site_id, options, &cancel).await {
            Ok(summary) => total.merge(summary),
            Err(e) => {
                error!(site_id, error = %e, "Site reindex failed");
                site_errors += 1;
            }
        }
    }

    info!(
        success = total.success,
        warnings = total.warnings(),
        skipped = total.skipped + total.disabled,
        errors = total.failed,
        cancelled = total.cancelled,
        site_errors,
        elapsed_ms = total.elapsed.as_millis() as u64,
        "Content indexer finished"
    );
    for failure in &total.failures {
        warn!(
            item_id = failure.item.item_id,
            site_id = failure.item.site_id,
            reason = %failure.reason,
            message = %failure.message,
            "Item failed"
        );
    }

    if total.exit_code() != 0 || site_errors > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
