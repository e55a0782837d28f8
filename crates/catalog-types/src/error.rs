//! Error types shared across the catalog crates.

use thiserror::Error;

/// Unified error type for configuration and shared operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
