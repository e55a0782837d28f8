//! Catalog cache manager.
//!
//! Keys:
//! - `script:{slug}`: one sealed [`CatalogItem`] per key
//! - `catalog:manifest`: sealed slug list of the last successful refresh
//!
//! Every frame carries a logical expiry (`created + ttl`) used for the
//! freshness decision, while the store keeps the bytes for the longer
//! retention period. A failed refresh therefore keeps serving the last
//! good catalog, and keys dropped from a new snapshot simply age out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use catalog_storage::KvStore;
use catalog_types::{CatalogItem, Settings};

use crate::codec::{self, OpenedFrame, MAX_ENTRY_BYTES};
use crate::error::CacheError;
use crate::secret::SecretKey;

/// Store key of the snapshot manifest.
pub const MANIFEST_KEY: &str = "catalog:manifest";

const ITEM_KEY_PREFIX: &str = "script:";

/// Store key for an item slug.
pub fn item_key(slug: &str) -> String {
    format!("{}{}", ITEM_KEY_PREFIX, slug)
}

/// Cache timing and size limits.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a refresh counts as fresh
    pub ttl: Duration,
    /// How long written bytes stay readable in the store
    pub retention: Duration,
    /// Ceiling for one sealed item entry
    pub max_entry_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(43_200),
            retention: Duration::from_secs(7 * 24 * 3600),
            max_entry_bytes: MAX_ENTRY_BYTES,
        }
    }
}

impl CacheConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.cache_ttl_secs),
            retention: Duration::from_secs(settings.stale_retention_secs),
            max_entry_bytes: MAX_ENTRY_BYTES,
        }
    }
}

/// Result of reading one cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Present and verified
    Hit(T),
    /// Absent or expired in the store
    Missing,
    /// Present but failed verification or decoding
    Corrupt(String),
}

impl<T> Lookup<T> {
    /// Collapse to `Option`, treating corrupt like missing.
    pub fn hit(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Missing | Lookup::Corrupt(_) => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

/// The freshness marker written at the end of each successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub refreshed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Slugs of the snapshot, in catalog order
    pub slugs: Vec<String>,
}

impl Manifest {
    pub fn is_fresh_at(&self, reference_time: DateTime<Utc>) -> bool {
        reference_time < self.expires_at
    }
}

#[derive(Serialize, Deserialize)]
struct ManifestBody {
    slugs: Vec<String>,
}

/// Owner of the HMAC key and of every read and write of cache entries.
pub struct CatalogCache {
    store: Arc<dyn KvStore>,
    key: SecretKey,
    config: CacheConfig,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn KvStore>, key: SecretKey, config: CacheConfig) -> Self {
        Self { store, key, config }
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.key
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store one item under its slug. Returns the sealed size in bytes.
    pub fn put(&self, item: &CatalogItem) -> Result<usize, CacheError> {
        self.put_at(item, Utc::now())
    }

    /// Store one item as if written at `now`.
    pub fn put_at(&self, item: &CatalogItem, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let plaintext = serde_json::to_vec(item)?;
        let store_key = item_key(&item.slug);
        let frame = self.seal(&store_key, now, &plaintext)?;

        if frame.len() > self.config.max_entry_bytes {
            return Err(CacheError::EntryTooLarge {
                slug: item.slug.clone(),
                size: frame.len(),
                limit: self.config.max_entry_bytes,
            });
        }

        self.store
            .set(&store_key, &frame, self.config.retention)?;
        debug!(slug = %item.slug, bytes = frame.len(), "Cached catalog item");
        Ok(frame.len())
    }

    /// Read and verify one item.
    pub fn get(&self, slug: &str) -> Result<Lookup<CatalogItem>, CacheError> {
        let store_key = item_key(slug);
        let frame = match self.read_frame(&store_key)? {
            Lookup::Hit(frame) => frame,
            Lookup::Missing => return Ok(Lookup::Missing),
            Lookup::Corrupt(reason) => return Ok(Lookup::Corrupt(reason)),
        };

        match serde_json::from_slice::<CatalogItem>(&frame.plaintext) {
            Ok(item) => Ok(Lookup::Hit(item)),
            Err(e) => {
                let reason = format!("undecodable item: {}", e);
                warn!(slug, reason = %reason, "Corrupt cache entry");
                Ok(Lookup::Corrupt(reason))
            }
        }
    }

    /// Record a completed refresh. Written last so readers never see a
    /// manifest pointing at entries that are not stored yet.
    pub fn write_manifest(&self, slugs: &[String], now: DateTime<Utc>) -> Result<(), CacheError> {
        let body = ManifestBody {
            slugs: slugs.to_vec(),
        };
        let plaintext = serde_json::to_vec(&body)?;
        let frame = self.seal(MANIFEST_KEY, now, &plaintext)?;
        self.store
            .set(MANIFEST_KEY, &frame, self.config.retention)?;
        debug!(entries = slugs.len(), "Wrote catalog manifest");
        Ok(())
    }

    /// Read and verify the manifest.
    pub fn manifest(&self) -> Result<Lookup<Manifest>, CacheError> {
        let frame = match self.read_frame(MANIFEST_KEY)? {
            Lookup::Hit(frame) => frame,
            Lookup::Missing => return Ok(Lookup::Missing),
            Lookup::Corrupt(reason) => return Ok(Lookup::Corrupt(reason)),
        };

        let body: ManifestBody = match serde_json::from_slice(&frame.plaintext) {
            Ok(body) => body,
            Err(e) => return Ok(Lookup::Corrupt(format!("undecodable manifest: {}", e))),
        };
        let (Some(refreshed_at), Some(expires_at)) = (
            DateTime::from_timestamp_millis(frame.created_at_ms),
            DateTime::from_timestamp_millis(frame.expires_at_ms),
        ) else {
            return Ok(Lookup::Corrupt("manifest timestamps out of range".to_string()));
        };

        Ok(Lookup::Hit(Manifest {
            refreshed_at,
            expires_at,
            slugs: body.slugs,
        }))
    }

    /// Whether the last successful refresh is still within its TTL at
    /// `reference_time`. A missing, corrupt or unreadable manifest is stale.
    pub fn is_fresh(&self, reference_time: DateTime<Utc>) -> bool {
        match self.manifest() {
            Ok(Lookup::Hit(manifest)) => manifest.is_fresh_at(reference_time),
            Ok(Lookup::Missing) => false,
            Ok(Lookup::Corrupt(reason)) => {
                warn!(reason = %reason, "Catalog manifest corrupt, treating cache as stale");
                false
            }
            Err(e) => {
                warn!(error = %e, "Could not read catalog manifest");
                false
            }
        }
    }

    /// All verified items of the current snapshot, in catalog order.
    ///
    /// Missing and corrupt entries are skipped with a warning.
    pub fn load_all(&self) -> Result<Vec<CatalogItem>, CacheError> {
        let manifest = match self.manifest()? {
            Lookup::Hit(manifest) => manifest,
            Lookup::Missing => return Ok(Vec::new()),
            Lookup::Corrupt(reason) => {
                warn!(reason = %reason, "Catalog manifest corrupt, no entries available");
                return Ok(Vec::new());
            }
        };

        let mut items = Vec::with_capacity(manifest.slugs.len());
        let mut missed = 0usize;
        for slug in &manifest.slugs {
            match self.get(slug)? {
                Lookup::Hit(item) => items.push(item),
                Lookup::Missing => {
                    warn!(slug = %slug, "Catalog entry missing from cache");
                    missed += 1;
                }
                Lookup::Corrupt(_) => missed += 1,
            }
        }

        if missed > 0 {
            warn!(
                missed,
                loaded = items.len(),
                "Some catalog entries could not be loaded"
            );
        }
        Ok(items)
    }

    /// Drop store entries past their retention. Returns how many went.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(self.store.purge_expired()?)
    }

    fn seal(
        &self,
        store_key: &str,
        now: DateTime<Utc>,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CacheError> {
        let created_at_ms = now.timestamp_millis();
        let ttl_ms = i64::try_from(self.config.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at_ms = created_at_ms.saturating_add(ttl_ms);
        codec::seal(&self.key, store_key, created_at_ms, expires_at_ms, plaintext)
    }

    fn read_frame(&self, store_key: &str) -> Result<Lookup<OpenedFrame>, CacheError> {
        let Some(bytes) = self.store.get(store_key)? else {
            return Ok(Lookup::Missing);
        };
        match codec::open(&self.key, store_key, &bytes) {
            Ok(frame) => Ok(Lookup::Hit(frame)),
            Err(reason) => {
                warn!(key = store_key, reason = %reason, "Cache entry failed verification");
                Ok(Lookup::Corrupt(reason))
            }
        }
    }
}
