//! Key-value storage for the script catalog.
//!
//! The cache layer is written against the [`KvStore`] trait: byte values
//! addressed by string keys, each written with a time-to-live. Two
//! implementations are provided:
//! - [`RocksStore`]: RocksDB-backed, survives restarts
//! - [`MemoryStore`]: in-process map, for tests and ephemeral hosts
//!
//! Expired values read as absent. Neither store interprets the bytes.

pub mod error;
pub mod memory;
pub mod rocks;
pub mod store;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use store::{KvStore, StoredValue};
