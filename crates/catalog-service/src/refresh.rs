//! Lazy catalog refresh.
//!
//! A refresh runs only when the manifest's TTL has expired (or when
//! forced), and only one runs at a time. Item entries are written first
//! and the manifest last, so a reader either sees the previous snapshot or
//! the complete new one. Any failure leaves the previous entries in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use catalog_cache::{CacheError, CatalogCache};
use catalog_ingest::{build_snapshot, validate, CatalogFetcher, IngestError};
use catalog_types::Settings;

use crate::guard::RefreshGuard;

/// Where the cache stood when a refresh call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Fresh,
    StaleFetching,
    StaleFetchFailed,
    StaleRefreshed,
}

/// What a refresh call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cache within its TTL; nothing fetched
    Fresh,
    /// Another refresh holds the guard; existing entries are served
    InProgress,
    /// Fetch or payload failed; previous entries retained
    FetchFailed { reason: String },
    /// The payload parsed but yielded nothing cacheable; the previous
    /// snapshot stays published and the next call retries
    NoUsableEntries { skipped: usize, rejected: usize },
    /// The store rejected a write; the manifest still lists the previous
    /// snapshot's slugs.
    ///
    /// Entries written before the failure are not rolled back, so a slug
    /// present in both snapshots may already carry its new content.
    WriteFailed { reason: String },
    /// New snapshot stored and published
    Refreshed {
        stored: usize,
        skipped: usize,
        rejected: usize,
    },
}

impl RefreshOutcome {
    pub fn state(&self) -> RefreshState {
        match self {
            RefreshOutcome::Fresh => RefreshState::Fresh,
            RefreshOutcome::InProgress => RefreshState::StaleFetching,
            RefreshOutcome::FetchFailed { .. }
            | RefreshOutcome::NoUsableEntries { .. }
            | RefreshOutcome::WriteFailed { .. } => RefreshState::StaleFetchFailed,
            RefreshOutcome::Refreshed { .. } => RefreshState::StaleRefreshed,
        }
    }
}

/// Runs catalog refreshes against one cache.
pub struct Refresher {
    settings: Arc<Settings>,
    cache: Arc<CatalogCache>,
    fetcher: Arc<dyn CatalogFetcher>,
    guard: RefreshGuard,
}

impl Refresher {
    pub fn new(
        settings: Arc<Settings>,
        cache: Arc<CatalogCache>,
        fetcher: Arc<dyn CatalogFetcher>,
    ) -> Self {
        Self {
            settings,
            cache,
            fetcher,
            guard: RefreshGuard::new(),
        }
    }

    /// True while a refresh holds the guard.
    pub fn is_refreshing(&self) -> bool {
        self.guard.is_running()
    }

    /// Refresh if the cache is stale at `now`.
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> RefreshOutcome {
        if self.cache.is_fresh(now) {
            debug!("Catalog cache is fresh");
            return RefreshOutcome::Fresh;
        }
        self.refresh(now, false).await
    }

    /// Refresh regardless of freshness. Still single-flight.
    pub async fn force_refresh(&self, now: DateTime<Utc>) -> RefreshOutcome {
        self.refresh(now, true).await
    }

    async fn refresh(&self, now: DateTime<Utc>, force: bool) -> RefreshOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            info!("Catalog refresh already in progress, serving cached entries");
            return RefreshOutcome::InProgress;
        };

        // A refresh may have completed between the freshness check and
        // acquiring the guard.
        if !force && self.cache.is_fresh(now) {
            return RefreshOutcome::Fresh;
        }

        info!(url = %self.settings.catalog_url, force, "Refreshing catalog");

        let raw = match self.fetcher.fetch(&self.settings.catalog_url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Catalog fetch failed, keeping cached entries");
                return RefreshOutcome::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let catalog = match validate(&raw) {
            Ok(catalog) => catalog,
            Err(e @ IngestError::MalformedPayload(_)) => {
                error!(error = %e, "Catalog payload rejected, keeping cached entries");
                return RefreshOutcome::FetchFailed {
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                warn!(error = %e, "Catalog ingest failed, keeping cached entries");
                return RefreshOutcome::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let snapshot = build_snapshot(catalog, |slug| self.settings.script_url(slug));

        let mut stored = Vec::with_capacity(snapshot.items.len());
        let mut skipped = 0usize;
        for item in &snapshot.items {
            match self.cache.put_at(item, now) {
                Ok(_) => stored.push(item.slug.clone()),
                Err(CacheError::EntryTooLarge { slug, size, limit }) => {
                    warn!(slug = %slug, size, limit, "Catalog entry too large, skipping");
                    skipped += 1;
                }
                Err(e) => {
                    error!(slug = %item.slug, error = %e, "Failed to cache catalog entry");
                    return RefreshOutcome::WriteFailed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        if stored.is_empty() {
            warn!(
                skipped,
                rejected = snapshot.rejected.len(),
                "Catalog payload had no usable entries, keeping cached entries"
            );
            return RefreshOutcome::NoUsableEntries {
                skipped,
                rejected: snapshot.rejected.len(),
            };
        }

        if let Err(e) = self.cache.write_manifest(&stored, now) {
            error!(error = %e, "Failed to write catalog manifest");
            return RefreshOutcome::WriteFailed {
                reason: e.to_string(),
            };
        }

        match self.cache.purge_expired() {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "Purged expired cache entries"),
            Err(e) => warn!(error = %e, "Failed to purge expired cache entries"),
        }

        let outcome = RefreshOutcome::Refreshed {
            stored: stored.len(),
            skipped,
            rejected: snapshot.rejected.len(),
        };
        info!(
            stored = stored.len(),
            skipped,
            rejected = snapshot.rejected.len(),
            "Catalog refreshed"
        );
        outcome
    }
}
