//! The key-value contract the cache is built on.

use std::time::Duration;

use chrono::Utc;

use crate::error::StorageError;

/// Byte-oriented, TTL-aware key-value store.
///
/// Implementations must treat an expired value exactly like a missing one.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, if present and not expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write `value` under `key`, replacing any previous value. The value
    /// stops being readable once `ttl` has elapsed.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StorageError>;

    /// Physically drop expired values. Returns how many were removed.
    fn purge_expired(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}

/// A value with its absolute expiry, as kept by the concrete stores.
///
/// Encoded as `expires_at_ms (i64 big-endian) | value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub expires_at_ms: i64,
    pub value: Vec<u8>,
}

const HEADER_LEN: usize = 8;

impl StoredValue {
    /// Wrap a value that expires `ttl` after `now_ms`.
    pub fn new(value: &[u8], ttl: Duration, now_ms: i64) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            expires_at_ms: now_ms.saturating_add(ttl_ms),
            value: value.to_vec(),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.value.len());
        out.extend_from_slice(&self.expires_at_ms.to_be_bytes());
        out.extend_from_slice(&self.value);
        out
    }

    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() < HEADER_LEN {
            return Err(StorageError::CorruptValue {
                key: key.to_string(),
                reason: format!("value shorter than {} byte header", HEADER_LEN),
            });
        }
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&bytes[..HEADER_LEN]);
        Ok(Self {
            expires_at_ms: i64::from_be_bytes(header),
            value: bytes[HEADER_LEN..].to_vec(),
        })
    }
}

/// Current wall-clock time in unix milliseconds.
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_value_encoding() {
        let stored = StoredValue::new(b"payload", Duration::from_secs(10), 1_000);
        assert_eq!(stored.expires_at_ms, 11_000);

        let decoded = StoredValue::from_bytes("k", &stored.to_bytes()).unwrap();
        assert_eq!(decoded, stored);
    }

    #[test]
    fn test_stored_value_expiry_boundary() {
        let stored = StoredValue::new(b"x", Duration::from_millis(5), 100);
        assert!(!stored.is_expired(104));
        assert!(stored.is_expired(105));
    }

    #[test]
    fn test_stored_value_short_header() {
        let err = StoredValue::from_bytes("short", b"abc").unwrap_err();
        assert!(matches!(err, StorageError::CorruptValue { .. }));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let stored = StoredValue::new(b"x", Duration::MAX, 1);
        assert_eq!(stored.expires_at_ms, i64::MAX);
    }
}
