//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

use catalog_storage::StorageError;

/// Errors raised by the cache layer.
///
/// Integrity failures are not errors: they surface as
/// [`Lookup::Corrupt`](crate::Lookup::Corrupt).
#[derive(Debug, Error)]
pub enum CacheError {
    /// Sealed entry would exceed the per-entry ceiling; nothing was written
    #[error("Entry {slug} too large: {size} bytes (limit {limit})")]
    EntryTooLarge {
        slug: String,
        size: usize,
        limit: usize,
    },

    /// Underlying store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Item could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression failed
    #[error("Compression error: {0}")]
    Compression(std::io::Error),

    /// Secret key could not be loaded or persisted
    #[error("Secret key file {}: {source}", path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Secret key material is unusable
    #[error("Invalid secret key: {0}")]
    InvalidKey(String),
}
