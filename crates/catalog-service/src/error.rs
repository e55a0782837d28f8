//! Service error types.

use thiserror::Error;

use catalog_cache::CacheError;
use catalog_ingest::FetchError;
use catalog_storage::StorageError;
use catalog_types::CatalogError;

/// Errors from wiring up a [`CatalogEngine`](crate::CatalogEngine).
///
/// Nothing past construction surfaces as an error: refresh reports a
/// [`RefreshOutcome`](crate::RefreshOutcome) and search returns hits.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] CatalogError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Fetcher error: {0}")]
    Fetch(#[from] FetchError),
}
