//! Upstream catalog retrieval.
//!
//! [`CatalogFetcher`] is the seam between the refresh logic and the
//! network. [`HttpFetcher`] talks to the real endpoint; [`MockFetcher`]
//! serves canned responses in tests.

mod http;
mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Why a fetch produced no payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Timeout waiting for upstream")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid client configuration: {0}")]
    Client(String),
}

/// Source of the raw catalog payload.
///
/// Implementations perform exactly one attempt per call.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    /// Fetch the raw catalog body from `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
