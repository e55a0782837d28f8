//! # catalog-search
//!
//! Keyword search over cached [`CatalogItem`]s.
//!
//! Scoring is deliberately simple: each query word must appear in the
//! item's name (+10) or description (+5), and every word must match.
//! Disabled items never appear in results.
//!
//! [`CatalogItem`]: catalog_types::CatalogItem

pub mod scorer;
pub mod snippet;

pub use scorer::{
    search, ScoredItem, SearchOptions, DEFAULT_LIMIT, DESCRIPTION_WEIGHT, NAME_WEIGHT,
};
pub use snippet::{snippet, SNIPPET_CHARS};
