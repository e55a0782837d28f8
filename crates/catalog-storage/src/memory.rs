//! In-process store.

use std::time::Duration;

use dashmap::DashMap;

use crate::error::StorageError;
use crate::store::{now_ms, KvStore, StoredValue};

/// `DashMap`-backed store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values held, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite the raw bytes under `key` without touching its expiry.
    ///
    /// Lets tests simulate on-disk tampering. Returns false if the key
    /// does not exist.
    pub fn overwrite_raw(&self, key: &str, value: Vec<u8>) -> bool {
        match self.entries.get_mut(key) {
            Some(mut stored) => {
                stored.value = value;
                true
            }
            None => false,
        }
    }

    /// Raw stored bytes regardless of expiry.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|stored| stored.value.clone())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let now = now_ms();
        match self.entries.get(key) {
            Some(stored) if !stored.is_expired(now) => Ok(Some(stored.value.clone())),
            _ => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StorageError> {
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl, now_ms()));
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, stored| !stored.is_expired(now));
        Ok(before - self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());

        store.set("a", b"one", Duration::from_secs(60)).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"one".to_vec()));

        store.set("a", b"two", Duration::from_secs(60)).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_reads_as_absent() {
        let store = MemoryStore::new();
        store.set("gone", b"x", Duration::ZERO).unwrap();
        assert!(store.get("gone").unwrap().is_none());
        assert_eq!(store.len(), 1);

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite_raw() {
        let store = MemoryStore::new();
        assert!(!store.overwrite_raw("nope", vec![1]));

        store.set("k", b"abc", Duration::from_secs(60)).unwrap();
        assert!(store.overwrite_raw("k", b"xyz".to_vec()));
        assert_eq!(store.get("k").unwrap(), Some(b"xyz".to_vec()));
        assert_eq!(store.raw("k"), Some(b"xyz".to_vec()));
    }
}
