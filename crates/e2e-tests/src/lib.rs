//! End-to-end test infrastructure for the script catalog.
//!
//! [`TestHarness`] wires a real RocksDB store in a temp directory, a key
//! file, and the HTTP fetcher pointed at a wiremock upstream, so tests
//! exercise the same path the CLI does.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_cache::{CacheConfig, CatalogCache, SecretKey};
use catalog_ingest::HttpFetcher;
use catalog_service::CatalogEngine;
use catalog_storage::RocksStore;
use catalog_types::Settings;

/// Path the mock upstream serves the catalog on.
pub const CATALOG_PATH: &str = "/api/categories";

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Mock upstream
    pub server: MockServer,
    /// Direct handle on the store, for tampering
    pub store: Arc<RocksStore>,
    pub engine: CatalogEngine,
}

impl TestHarness {
    /// Start a mock upstream and build an engine against it.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");

        let settings = Settings {
            catalog_url: format!("{}{}", server.uri(), CATALOG_PATH),
            script_url_template: "https://scripts.example.test/?id={slug}".to_string(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            fetch_timeout_secs: 2,
            ..Default::default()
        };

        let store =
            Arc::new(RocksStore::open(&settings.db_path()).expect("Failed to open test store"));
        let key = SecretKey::resolve(&settings).expect("Failed to resolve key");
        let cache = Arc::new(CatalogCache::new(
            store.clone(),
            key,
            CacheConfig::from_settings(&settings),
        ));
        let fetcher = Arc::new(
            HttpFetcher::new(Duration::from_secs(settings.fetch_timeout_secs))
                .expect("Failed to build fetcher"),
        );
        let engine = CatalogEngine::new(settings, cache, fetcher);

        Self {
            _temp_dir: temp_dir,
            server,
            store,
            engine,
        }
    }

    /// Serve `body` as the catalog, replacing any earlier response.
    pub async fn serve_catalog(&self, body: &Value) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve `body` after `delay`.
    pub async fn serve_catalog_slowly(&self, body: &Value, delay: Duration) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(body)
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Make the upstream fail with `status`.
    pub async fn fail_catalog(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("GET"))
            .and(path(CATALOG_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// How many requests reached the upstream.
    pub async fn upstream_hits(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

/// A point past the default 12 hour freshness window.
pub fn after_ttl() -> DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(13)
}

/// A small catalog with overlapping keywords.
pub fn sample_catalog() -> Value {
    json!([
        {
            "name": "Containers & Docker",
            "scripts": [
                {"name": "Docker", "slug": "docker", "type": "ct",
                 "description": "Docker container runtime in a lightweight LXC"},
                {"name": "Portainer", "slug": "portainer", "type": "ct",
                 "description": "Web UI to manage Docker environments"}
            ]
        },
        {
            "name": "Network",
            "scripts": [
                {"name": "Nginx Proxy Manager", "slug": "nginxproxymanager",
                 "description": "Reverse proxy with a simple web interface and free SSL"},
                {"name": "Caddy", "slug": "caddy",
                 "description": "Fast reverse proxy server with automatic HTTPS"},
                {"name": "Pi-hole", "slug": "pihole",
                 "description": "Network-wide ad blocking"}
            ]
        }
    ])
}
