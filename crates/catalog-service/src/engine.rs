//! The catalog context object handed to hosts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use catalog_cache::{CacheConfig, CatalogCache, KeySource, Lookup, SecretKey};
use catalog_ingest::{CatalogFetcher, HttpFetcher};
use catalog_search::{search, SearchOptions};
use catalog_storage::RocksStore;
use catalog_types::{SearchHit, Settings};

use crate::error::ServiceError;
use crate::refresh::{RefreshOutcome, Refresher};

/// Snapshot of cache health for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatus {
    pub enabled: bool,
    pub fresh: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Slugs listed in the manifest
    pub entries: usize,
    /// Set when the manifest exists but failed verification
    pub manifest_error: Option<String>,
    pub key_source: KeySource,
}

/// Everything needed to refresh and search the catalog.
pub struct CatalogEngine {
    settings: Arc<Settings>,
    cache: Arc<CatalogCache>,
    refresher: Refresher,
}

impl CatalogEngine {
    /// Assemble an engine from already-built parts.
    pub fn new(
        settings: Settings,
        cache: Arc<CatalogCache>,
        fetcher: Arc<dyn CatalogFetcher>,
    ) -> Self {
        let settings = Arc::new(settings);
        let refresher = Refresher::new(settings.clone(), cache.clone(), fetcher);
        Self {
            settings,
            cache,
            refresher,
        }
    }

    /// Open the on-disk cache, resolve the HMAC key and build the HTTP
    /// fetcher described by `settings`.
    pub fn open(settings: Settings) -> Result<Self, ServiceError> {
        settings.validate()?;

        let db_path = settings.db_path();
        info!(path = ?db_path, "Opening catalog cache");
        let store = Arc::new(RocksStore::open(&db_path)?);

        let key = SecretKey::resolve(&settings)?;
        debug!(source = ?key.source(), "HMAC key ready");

        let cache = Arc::new(CatalogCache::new(
            store,
            key,
            CacheConfig::from_settings(&settings),
        ));
        let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
            settings.fetch_timeout_secs,
        ))?);

        Ok(Self::new(settings, cache, fetcher))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Search options using the configured result cap.
    pub fn default_options(&self) -> SearchOptions {
        SearchOptions::new().with_limit(self.settings.max_results)
    }

    /// Search the cached catalog. Never fails: storage problems are logged
    /// and yield no results, and a disabled engine always returns nothing.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        if !self.settings.enabled {
            return Vec::new();
        }

        let items = match self.cache.load_all() {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Could not read catalog cache");
                return Vec::new();
            }
        };

        search(query, &items, options)
            .iter()
            .map(|scored| scored.to_hit())
            .collect()
    }

    /// Refresh if stale, then search.
    pub async fn search_with_refresh(&self, query: &str, options: &SearchOptions) -> Vec<SearchHit> {
        if !self.settings.enabled {
            return Vec::new();
        }
        self.refresh_if_stale().await;
        self.search(query, options)
    }

    pub async fn refresh_if_stale(&self) -> RefreshOutcome {
        self.refresh_if_stale_at(Utc::now()).await
    }

    /// As [`refresh_if_stale`](Self::refresh_if_stale) with an explicit clock.
    pub async fn refresh_if_stale_at(&self, now: DateTime<Utc>) -> RefreshOutcome {
        if !self.settings.enabled {
            debug!("Catalog disabled, skipping refresh");
            return RefreshOutcome::Fresh;
        }
        self.refresher.refresh_if_stale(now).await
    }

    pub async fn force_refresh(&self) -> RefreshOutcome {
        self.refresher.force_refresh(Utc::now()).await
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_refreshing()
    }

    pub fn status(&self) -> CatalogStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> CatalogStatus {
        let mut status = CatalogStatus {
            enabled: self.settings.enabled,
            fresh: false,
            refreshed_at: None,
            expires_at: None,
            entries: 0,
            manifest_error: None,
            key_source: self.cache.secret_key().source().clone(),
        };

        match self.cache.manifest() {
            Ok(Lookup::Hit(manifest)) => {
                status.fresh = manifest.is_fresh_at(now);
                status.refreshed_at = Some(manifest.refreshed_at);
                status.expires_at = Some(manifest.expires_at);
                status.entries = manifest.slugs.len();
            }
            Ok(Lookup::Missing) => {}
            Ok(Lookup::Corrupt(reason)) => status.manifest_error = Some(reason),
            Err(e) => status.manifest_error = Some(e.to_string()),
        }
        status
    }
}

/// Run [`CatalogEngine::refresh_if_stale`] every `interval` until `cancel`
/// fires. The first tick runs immediately.
pub fn spawn_refresh_loop(
    engine: Arc<CatalogEngine>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "Catalog refresh loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let outcome = engine.refresh_if_stale().await;
                    debug!(outcome = ?outcome, "Refresh loop tick");
                }
            }
        }

        info!("Catalog refresh loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_ingest::{FetchError, MockFetcher};
    use catalog_storage::MemoryStore;
    use serde_json::json;

    fn sample_payload() -> Vec<u8> {
        serde_json::to_vec(&json!([
            {"name": "Containers", "scripts": [
                {"name": "Docker", "slug": "docker", "description": "Container runtime for LXC"},
                {"name": "Nginx Proxy Manager", "slug": "npm",
                 "description": "Reverse proxy with a web UI"},
                {"name": "Docker Old", "slug": "docker-old", "disable": true}
            ]}
        ]))
        .unwrap()
    }

    fn create_engine(settings: Settings, fetcher: Arc<MockFetcher>) -> CatalogEngine {
        let key = SecretKey::from_bytes(b"engine-test-key".to_vec()).unwrap();
        let cache = Arc::new(CatalogCache::new(
            Arc::new(MemoryStore::new()),
            key,
            CacheConfig::from_settings(&settings),
        ));
        CatalogEngine::new(settings, cache, fetcher)
    }

    #[tokio::test]
    async fn test_search_with_refresh() {
        let fetcher = Arc::new(MockFetcher::with_body(sample_payload()));
        let engine = create_engine(Settings::default(), fetcher.clone());

        let hits = engine
            .search_with_refresh("docker", &engine.default_options())
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Docker");
        assert_eq!(
            hits[0].url,
            "https://community-scripts.github.io/ProxmoxVE/scripts?id=docker"
        );

        engine.search_with_refresh("proxy", &SearchOptions::new()).await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_without_cache_is_empty() {
        let fetcher = Arc::new(MockFetcher::failing(FetchError::Status(502)));
        let engine = create_engine(Settings::default(), fetcher);

        assert!(engine.search("docker", &SearchOptions::new()).is_empty());
        assert!(engine
            .search_with_refresh("docker", &SearchOptions::new())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_disabled_engine_returns_nothing() {
        let fetcher = Arc::new(MockFetcher::with_body(sample_payload()));
        let settings = Settings {
            enabled: false,
            ..Default::default()
        };
        let engine = create_engine(settings, fetcher.clone());

        assert!(engine
            .search_with_refresh("docker", &SearchOptions::new())
            .await
            .is_empty());
        assert_eq!(engine.refresh_if_stale().await, RefreshOutcome::Fresh);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_status_reports_manifest() {
        let fetcher = Arc::new(MockFetcher::with_body(sample_payload()));
        let engine = create_engine(Settings::default(), fetcher);

        let before = engine.status();
        assert!(!before.fresh);
        assert_eq!(before.entries, 0);
        assert_eq!(before.key_source, KeySource::Configured);

        engine.force_refresh().await;
        let after = engine.status();
        assert!(after.fresh);
        assert_eq!(after.entries, 3);
        assert!(after.refreshed_at.is_some());
        assert!(after.manifest_error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_loop_stops_on_cancel() {
        let fetcher = Arc::new(MockFetcher::with_body(sample_payload()));
        let engine = Arc::new(create_engine(Settings::default(), fetcher.clone()));
        let cancel = CancellationToken::new();

        let handle = spawn_refresh_loop(engine.clone(), Duration::from_secs(3600), cancel.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.calls(), 1);
        assert!(engine.status().fresh);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_open_with_rocks_store() {
        let temp = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            data_dir: temp.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let engine = CatalogEngine::open(settings.clone()).unwrap();
        assert!(settings.db_path().exists());
        assert!(matches!(engine.status().key_source, KeySource::Generated(_)));
    }

    #[test]
    fn test_open_rejects_invalid_settings() {
        let settings = Settings {
            max_results: 0,
            ..Default::default()
        };
        assert!(matches!(
            CatalogEngine::open(settings),
            Err(ServiceError::Config(_))
        ));
    }
}
