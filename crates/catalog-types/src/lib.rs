//! # catalog-types
//!
//! Shared domain types for the script catalog.
//!
//! - [`CatalogItem`]: one installable script, as stored in the cache
//! - [`SearchHit`]: one ranked result handed back to the host
//! - [`Settings`]: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use catalog_types::CatalogItem;
//!
//! let item = CatalogItem::new("Docker", "docker", "Containers on LXC");
//! assert!(!item.disabled);
//! ```

pub mod config;
pub mod error;
pub mod item;

pub use config::Settings;
pub use error::CatalogError;
pub use item::{CatalogItem, SearchHit, MAX_DESCRIPTION_CHARS};
