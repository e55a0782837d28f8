//! Canned fetcher for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CatalogFetcher, FetchError};

/// Fetcher that returns a configurable response and counts calls.
pub struct MockFetcher {
    response: Mutex<Result<Vec<u8>, FetchError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFetcher {
    /// Always return `body`.
    pub fn with_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            response: Mutex::new(Ok(body.into())),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the response for subsequent calls.
    pub fn set_response(&self, response: Result<Vec<u8>, FetchError>) {
        let mut guard = match self.response.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = response;
    }

    /// Number of times `fetch` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogFetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.response.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
