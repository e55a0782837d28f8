//! # catalog-ingest
//!
//! Turns the upstream catalog into a snapshot of [`CatalogItem`]s.
//!
//! Pipeline: [`CatalogFetcher::fetch`] -> [`validate`] -> [`build_snapshot`]
//! (slug assignment and URL derivation). Per-script problems are skipped
//! and reported; only a payload whose top level is not a list fails the
//! whole batch.
//!
//! [`CatalogItem`]: catalog_types::CatalogItem

pub mod error;
pub mod fetch;
pub mod slug;
pub mod snapshot;
pub mod validate;

pub use error::IngestError;
pub use fetch::{CatalogFetcher, FetchError, HttpFetcher, MockFetcher};
pub use slug::{assign_slugs, slugify, SlugRequest, MAX_SLUG_LEN};
pub use snapshot::{build_snapshot, CatalogSnapshot};
pub use validate::{validate, Rejection, ScriptRecord, ValidScript, ValidatedCatalog};
