//! Ingest error types.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that abort a whole ingest batch.
///
/// Problems with individual scripts are not errors; they are reported as
/// [`Rejection`](crate::Rejection)s.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upstream could not be fetched
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Payload is not JSON, or its top level is not a list
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}
