//! Sealed entry frames.
//!
//! Frame layout:
//!
//! ```text
//! version (1) | tag (32) | created_at_ms (8, BE) | expires_at_ms (8, BE) | zlib payload
//! ```
//!
//! The tag is HMAC-SHA256 over the store key, both timestamps and the
//! compressed payload. Binding the store key means a valid frame copied
//! under another key fails verification too.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CacheError;
use crate::secret::SecretKey;

type HmacSha256 = Hmac<Sha256>;

/// Current frame format version.
pub const FRAME_VERSION: u8 = 1;

/// Length of the integrity tag.
pub const TAG_LEN: usize = 32;

/// Fixed zlib level: good ratio on short JSON without much CPU.
pub const COMPRESSION_LEVEL: u32 = 6;

/// Ceiling for one sealed item entry, header included.
pub const MAX_ENTRY_BYTES: usize = 10_240;

const HEADER_LEN: usize = 1 + TAG_LEN + 8 + 8;

/// Upper bound on inflated payload size; anything larger is corrupt.
const MAX_INFLATED_BYTES: u64 = 1024 * 1024;

/// A verified, decompressed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedFrame {
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub plaintext: Vec<u8>,
}

/// Compress and sign `plaintext` for storage under `store_key`.
pub fn seal(
    key: &SecretKey,
    store_key: &str,
    created_at_ms: i64,
    expires_at_ms: i64,
    plaintext: &[u8],
) -> Result<Vec<u8>, CacheError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    encoder
        .write_all(plaintext)
        .map_err(CacheError::Compression)?;
    let compressed = encoder.finish().map_err(CacheError::Compression)?;

    let tag = compute_tag(key, store_key, created_at_ms, expires_at_ms, &compressed)?;

    let mut frame = Vec::with_capacity(HEADER_LEN + compressed.len());
    frame.push(FRAME_VERSION);
    frame.extend_from_slice(&tag);
    frame.extend_from_slice(&created_at_ms.to_be_bytes());
    frame.extend_from_slice(&expires_at_ms.to_be_bytes());
    frame.extend_from_slice(&compressed);
    Ok(frame)
}

/// Verify and decompress a frame read from `store_key`.
///
/// `Err` carries a human-readable reason; the caller treats it as corrupt.
pub fn open(key: &SecretKey, store_key: &str, frame: &[u8]) -> Result<OpenedFrame, String> {
    if frame.len() < HEADER_LEN {
        return Err(format!("frame too short ({} bytes)", frame.len()));
    }
    if frame[0] != FRAME_VERSION {
        return Err(format!("unknown frame version {}", frame[0]));
    }

    let tag = &frame[1..1 + TAG_LEN];
    let created_at_ms = read_i64(&frame[1 + TAG_LEN..1 + TAG_LEN + 8]);
    let expires_at_ms = read_i64(&frame[1 + TAG_LEN + 8..HEADER_LEN]);
    let compressed = &frame[HEADER_LEN..];

    let mut mac = new_mac(key).map_err(|e| e.to_string())?;
    feed_mac(&mut mac, store_key, created_at_ms, expires_at_ms, compressed);
    mac.verify_slice(tag)
        .map_err(|_| "integrity tag mismatch".to_string())?;

    let mut plaintext = Vec::new();
    ZlibDecoder::new(compressed)
        .take(MAX_INFLATED_BYTES + 1)
        .read_to_end(&mut plaintext)
        .map_err(|e| format!("decompression failed: {}", e))?;
    if plaintext.len() as u64 > MAX_INFLATED_BYTES {
        return Err("inflated payload exceeds limit".to_string());
    }

    Ok(OpenedFrame {
        created_at_ms,
        expires_at_ms,
        plaintext,
    })
}

fn compute_tag(
    key: &SecretKey,
    store_key: &str,
    created_at_ms: i64,
    expires_at_ms: i64,
    compressed: &[u8],
) -> Result<[u8; TAG_LEN], CacheError> {
    let mut mac = new_mac(key)?;
    feed_mac(&mut mac, store_key, created_at_ms, expires_at_ms, compressed);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

fn new_mac(key: &SecretKey) -> Result<HmacSha256, CacheError> {
    HmacSha256::new_from_slice(key.expose()).map_err(|e| CacheError::InvalidKey(e.to_string()))
}

fn feed_mac(
    mac: &mut HmacSha256,
    store_key: &str,
    created_at_ms: i64,
    expires_at_ms: i64,
    compressed: &[u8],
) {
    mac.update(&(store_key.len() as u64).to_be_bytes());
    mac.update(store_key.as_bytes());
    mac.update(&created_at_ms.to_be_bytes());
    mac.update(&expires_at_ms.to_be_bytes());
    mac.update(compressed);
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}
