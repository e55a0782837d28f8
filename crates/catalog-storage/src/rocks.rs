//! RocksDB-backed store.
//!
//! Values live in a dedicated `entries` column family, each prefixed with
//! its absolute expiry. Expired values are hidden on read and removed by
//! [`KvStore::purge_expired`].

use std::path::Path;
use std::time::Duration;

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::store::{now_ms, KvStore, StoredValue};

/// Column family name for cache entries
pub const CF_ENTRIES: &str = "entries";

/// Persistent TTL store on top of RocksDB.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open the store at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening catalog store at {:?}", path);
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(CF_ENTRIES, Options::default())];
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn entries_cf(&self) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(CF_ENTRIES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_ENTRIES.to_string()))
    }

    /// Overwrite the raw payload under `key`, keeping its expiry.
    ///
    /// Used to simulate on-disk tampering. Returns false if the key does
    /// not exist.
    pub fn overwrite_raw(&self, key: &str, value: &[u8]) -> Result<bool, StorageError> {
        let cf = self.entries_cf()?;
        let Some(bytes) = self.db.get_cf(cf, key.as_bytes())? else {
            return Ok(false);
        };
        let mut stored = StoredValue::from_bytes(key, &bytes)?;
        stored.value = value.to_vec();
        self.db.put_cf(cf, key.as_bytes(), stored.to_bytes())?;
        Ok(true)
    }

    /// Flush the entries column family to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        let cf = self.entries_cf()?;
        self.db.flush_cf(cf)?;
        Ok(())
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.entries_cf()?;
        let Some(bytes) = self.db.get_cf(cf, key.as_bytes())? else {
            return Ok(None);
        };

        let stored = match StoredValue::from_bytes(key, &bytes) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key, error = %e, "Dropping unreadable stored value");
                self.db.delete_cf(cf, key.as_bytes())?;
                return Ok(None);
            }
        };

        if stored.is_expired(now_ms()) {
            debug!(key, "Stored value expired");
            return Ok(None);
        }
        Ok(Some(stored.value))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StorageError> {
        let cf = self.entries_cf()?;
        let stored = StoredValue::new(value, ttl, now_ms());
        self.db.put_cf(cf, key.as_bytes(), stored.to_bytes())?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        let cf = self.entries_cf()?;
        let now = now_ms();

        let mut batch = WriteBatch::default();
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);
            let expired = StoredValue::from_bytes(&key_str, &value)
                .map(|stored| stored.is_expired(now))
                .unwrap_or(true);
            if expired {
                batch.delete_cf(cf, &key);
                count += 1;
            }
        }

        if count > 0 {
            self.db.write(batch)?;
            debug!(count, "Purged expired catalog entries");
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_set_and_get() {
        let (store, _temp) = create_test_store();
        assert!(store.get("script:docker").unwrap().is_none());

        store
            .set("script:docker", b"payload", Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            store.get("script:docker").unwrap(),
            Some(b"payload".to_vec())
        );
    }

    #[test]
    fn test_expired_value_hidden_and_purged() {
        let (store, _temp) = create_test_store();
        store.set("old", b"x", Duration::ZERO).unwrap();
        store.set("new", b"y", Duration::from_secs(60)).unwrap();

        assert!(store.get("old").unwrap().is_none());
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.get("new").unwrap(), Some(b"y".to_vec()));
        assert_eq!(store.purge_expired().unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = RocksStore::open(temp_dir.path()).unwrap();
            store.set("k", b"v", Duration::from_secs(60)).unwrap();
            store.flush().unwrap();
        }
        let store = RocksStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_overwrite_raw_keeps_key() {
        let (store, _temp) = create_test_store();
        assert!(!store.overwrite_raw("missing", b"z").unwrap());

        store.set("k", b"abc", Duration::from_secs(60)).unwrap();
        assert!(store.overwrite_raw("k", b"tampered").unwrap());
        assert_eq!(store.get("k").unwrap(), Some(b"tampered".to_vec()));
    }
}
