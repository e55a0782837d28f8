//! Configuration loading for the script catalog.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/script-catalog/config.toml.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::CatalogError;

/// Placeholder replaced by the item slug in `script_url_template`.
pub const SLUG_PLACEHOLDER: &str = "{slug}";

/// Main application settings
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// When false, search returns no results and refresh is skipped
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Upstream catalog endpoint (JSON list of categories)
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Result URL template; `{slug}` is substituted
    #[serde(default = "default_script_url_template")]
    pub script_url_template: String,

    /// Directory holding the cache database and the HMAC key file
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// HMAC key override (never written to disk when set)
    #[serde(default)]
    pub hmac_secret_key: Option<String>,

    /// Freshness window for a refreshed catalog, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long entries stay readable in the store after being written,
    /// so a failed refresh can keep serving the last good catalog
    #[serde(default = "default_stale_retention_secs")]
    pub stale_retention_secs: u64,

    /// Timeout for the upstream fetch
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of search results
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_enabled() -> bool {
    true
}

fn default_catalog_url() -> String {
    "https://community-scripts.github.io/ProxmoxVE/api/categories".to_string()
}

fn default_script_url_template() -> String {
    "https://community-scripts.github.io/ProxmoxVE/scripts?id={slug}".to_string()
}

fn default_data_dir() -> String {
    ProjectDirs::from("", "", "script-catalog")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_cache_ttl_secs() -> u64 {
    43_200
}

fn default_stale_retention_secs() -> u64 {
    7 * 24 * 3600
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_results() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            catalog_url: default_catalog_url(),
            script_url_template: default_script_url_template(),
            data_dir: default_data_dir(),
            hmac_secret_key: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            stale_retention_secs: default_stale_retention_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_results: default_max_results(),
            log_level: default_log_level(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("enabled", &self.enabled)
            .field("catalog_url", &self.catalog_url)
            .field("script_url_template", &self.script_url_template)
            .field("data_dir", &self.data_dir)
            .field(
                "hmac_secret_key",
                &self.hmac_secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("stale_retention_secs", &self.stale_retention_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("max_results", &self.max_results)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/script-catalog/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (CATALOG_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, CatalogError> {
        let config_dir = ProjectDirs::from("", "", "script-catalog")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("enabled", default_enabled())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("catalog_url", default_catalog_url())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("script_url_template", default_script_url_template())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("data_dir", default_data_dir())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("cache_ttl_secs", default_cache_ttl_secs())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("stale_retention_secs", default_stale_retention_secs())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("fetch_timeout_secs", default_fetch_timeout_secs())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("max_results", default_max_results() as u64)
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| CatalogError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CATALOG_CATALOG_URL, CATALOG_HMAC_SECRET_KEY, CATALOG_CACHE_TTL_SECS, ...
        // No key separator: field names contain underscores.
        builder = builder.add_source(Environment::with_prefix("CATALOG").try_parsing(true));

        let config = builder
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| CatalogError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.cache_ttl_secs == 0 {
            return Err(CatalogError::Config("cache_ttl_secs must be > 0".to_string()));
        }
        if self.stale_retention_secs < self.cache_ttl_secs {
            return Err(CatalogError::Config(format!(
                "stale_retention_secs ({}) must be >= cache_ttl_secs ({})",
                self.stale_retention_secs, self.cache_ttl_secs
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(CatalogError::Config("fetch_timeout_secs must be > 0".to_string()));
        }
        if self.max_results == 0 {
            return Err(CatalogError::Config("max_results must be > 0".to_string()));
        }
        if !self.script_url_template.contains(SLUG_PLACEHOLDER) {
            return Err(CatalogError::Config(format!(
                "script_url_template must contain {}",
                SLUG_PLACEHOLDER
            )));
        }
        Ok(())
    }

    /// Public page URL for a slug.
    pub fn script_url(&self, slug: &str) -> String {
        self.script_url_template.replace(SLUG_PLACEHOLDER, slug)
    }

    /// Expand ~ in data_dir to the actual home directory
    pub fn expanded_data_dir(&self) -> PathBuf {
        if let Some(rest) = self.data_dir.strip_prefix("~/") {
            if let Some(dirs) = BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.data_dir)
    }

    /// RocksDB directory for cache entries
    pub fn db_path(&self) -> PathBuf {
        self.expanded_data_dir().join("cache")
    }

    /// Location of the generated HMAC key
    pub fn key_path(&self) -> PathBuf {
        self.expanded_data_dir().join("hmac.key")
    }
}
