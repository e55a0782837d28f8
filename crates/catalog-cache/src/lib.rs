//! # catalog-cache
//!
//! Per-entry cache for catalog items, layered on a [`KvStore`].
//!
//! Each item is stored under its own key as a sealed frame:
//! JSON, zlib-compressed, then authenticated with HMAC-SHA256 using a
//! per-installation [`SecretKey`]. Frames that fail verification are
//! reported as [`Lookup::Corrupt`] and never decoded.
//!
//! A signed manifest entry records the slugs of the last successful
//! refresh and the deadline until which that refresh counts as fresh.
//!
//! [`KvStore`]: catalog_storage::KvStore

pub mod cache;
pub mod codec;
pub mod error;
pub mod secret;

pub use cache::{item_key, CacheConfig, CatalogCache, Lookup, Manifest, MANIFEST_KEY};
pub use codec::{COMPRESSION_LEVEL, MAX_ENTRY_BYTES};
pub use error::CacheError;
pub use secret::{KeySource, SecretKey};
