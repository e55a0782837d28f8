//! Command implementations for the catalog CLI.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use catalog_search::SearchOptions;
use catalog_service::{spawn_refresh_loop, CatalogEngine, CatalogStatus, RefreshOutcome};
use catalog_types::{SearchHit, Settings};

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    data_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over settings.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn open_engine(settings: Settings) -> Result<CatalogEngine> {
    info!(data_dir = %settings.expanded_data_dir().display(), "Opening catalog");
    CatalogEngine::open(settings).context("Failed to open catalog")
}

/// Refresh the cache, printing what happened.
pub async fn run_refresh(settings: Settings, force: bool) -> Result<()> {
    let engine = open_engine(settings)?;
    let outcome = if force {
        engine.force_refresh().await
    } else {
        engine.refresh_if_stale().await
    };

    println!("{}", describe_outcome(&outcome));
    match outcome {
        RefreshOutcome::FetchFailed { reason } | RefreshOutcome::WriteFailed { reason } => {
            bail!("Refresh failed: {}", reason)
        }
        RefreshOutcome::NoUsableEntries { .. } => {
            bail!("Refresh failed: upstream catalog had no usable entries")
        }
        _ => Ok(()),
    }
}

/// Search and print hits.
pub async fn run_search(
    settings: Settings,
    query: &str,
    limit: Option<usize>,
    json: bool,
    offline: bool,
) -> Result<()> {
    let engine = open_engine(settings)?;
    let mut options = engine.default_options();
    if let Some(limit) = limit {
        options = SearchOptions::new().with_limit(limit);
    }

    let hits = if offline {
        engine.search(query, &options)
    } else {
        engine.search_with_refresh(query, &options).await
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&hits).context("Failed to encode results")?
        );
    } else {
        print!("{}", format_hits(&hits));
    }
    Ok(())
}

/// Print cache status.
pub fn run_status(settings: Settings) -> Result<()> {
    let engine = open_engine(settings)?;
    print!("{}", format_status(&engine.status()));
    Ok(())
}

/// Run the refresh loop until Ctrl+C or SIGTERM.
pub async fn run_watch(settings: Settings, interval_secs: u64) -> Result<()> {
    if interval_secs == 0 {
        bail!("--interval-secs must be > 0");
    }
    let engine = Arc::new(open_engine(settings)?);
    let cancel = CancellationToken::new();
    let handle = spawn_refresh_loop(
        engine,
        Duration::from_secs(interval_secs),
        cancel.clone(),
    );

    shutdown_signal().await;
    cancel.cancel();
    handle.await.context("Refresh loop panicked")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

fn describe_outcome(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Fresh => "Catalog is fresh, nothing to do".to_string(),
        RefreshOutcome::InProgress => "Another refresh is in progress".to_string(),
        RefreshOutcome::FetchFailed { reason } => {
            format!("Fetch failed ({}); cached entries kept", reason)
        }
        RefreshOutcome::NoUsableEntries { skipped, rejected } => format!(
            "No usable entries ({} too large, {} malformed); cached entries kept",
            skipped, rejected
        ),
        RefreshOutcome::WriteFailed { reason } => {
            format!("Cache write failed ({}); previous snapshot kept", reason)
        }
        RefreshOutcome::Refreshed {
            stored,
            skipped,
            rejected,
        } => format!(
            "Refreshed: {} stored, {} too large, {} malformed",
            stored, skipped, rejected
        ),
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matching scripts\n".to_string();
    }
    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!("[{:>3}] {}\n      {}\n", hit.score, hit.title, hit.url));
        if !hit.description.is_empty() {
            out.push_str(&format!("      {}\n", hit.description));
        }
    }
    out
}

fn format_status(status: &CatalogStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("Enabled:      {}\n", status.enabled));
    out.push_str(&format!("Fresh:        {}\n", status.fresh));
    out.push_str(&format!("Entries:      {}\n", status.entries));
    if let Some(refreshed_at) = status.refreshed_at {
        out.push_str(&format!("Refreshed at: {}\n", refreshed_at.to_rfc3339()));
    }
    if let Some(expires_at) = status.expires_at {
        out.push_str(&format!("Expires at:   {}\n", expires_at.to_rfc3339()));
    }
    if let Some(error) = &status.manifest_error {
        out.push_str(&format!("Manifest:     corrupt ({})\n", error));
    }
    out.push_str(&format!("Key source:   {:?}\n", status.key_source));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_settings_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("catalog.toml");
        std::fs::write(&config_path, "max_results = 7\nlog_level = \"warn\"\n").unwrap();

        let settings = load_settings(
            Some(config_path.to_str().unwrap()),
            Some("/srv/catalog"),
            Some("debug"),
        )
        .unwrap();

        assert_eq!(settings.max_results, 7);
        assert_eq!(settings.data_dir, "/srv/catalog");
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_format_hits() {
        assert_eq!(format_hits(&[]), "No matching scripts\n");

        let hits = vec![SearchHit {
            title: "Docker".to_string(),
            url: "https://example.test/scripts?id=docker".to_string(),
            description: "Container runtime".to_string(),
            score: 10,
        }];
        let out = format_hits(&hits);
        assert!(out.starts_with("[ 10] Docker\n"));
        assert!(out.contains("https://example.test/scripts?id=docker"));
        assert!(out.contains("Container runtime"));
    }

    #[test]
    fn test_describe_outcome() {
        let text = describe_outcome(&RefreshOutcome::Refreshed {
            stored: 3,
            skipped: 1,
            rejected: 2,
        });
        assert_eq!(text, "Refreshed: 3 stored, 1 too large, 2 malformed");

        let text = describe_outcome(&RefreshOutcome::NoUsableEntries {
            skipped: 0,
            rejected: 4,
        });
        assert_eq!(
            text,
            "No usable entries (0 too large, 4 malformed); cached entries kept"
        );
    }
}
