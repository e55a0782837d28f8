//! # catalog-service
//!
//! Entry point for hosts embedding the script catalog.
//!
//! [`CatalogEngine`] owns the cache, the fetcher and the refresh guard.
//! Hosts call [`CatalogEngine::search_with_refresh`]: the catalog is
//! refreshed lazily when its TTL has run out, and search always answers
//! from whatever verified entries are cached, never with an error.

pub mod engine;
pub mod error;
pub mod guard;
pub mod refresh;

pub use engine::{spawn_refresh_loop, CatalogEngine, CatalogStatus};
pub use error::ServiceError;
pub use guard::{RefreshGuard, RefreshPermit};
pub use refresh::{RefreshOutcome, RefreshState, Refresher};
