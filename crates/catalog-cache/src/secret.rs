//! Per-installation HMAC key.
//!
//! Resolution order: explicit override from settings (which already folds
//! in `CATALOG_HMAC_SECRET_KEY`), then the key file in the data directory,
//! generating and persisting a fresh key when the file is absent.
//!
//! Generation runs under an exclusive lock on `<key file>.lock`, so when
//! several processes or threads race, the first writer wins and everyone
//! else adopts the persisted key.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretSlice};
use tracing::{debug, info, warn};

use catalog_types::Settings;

use crate::error::CacheError;

/// Length of a generated key in bytes.
pub const KEY_LEN: usize = 32;

/// Serializes generation within this process; the file lock covers others.
static KEY_INIT: Mutex<()> = Mutex::new(());

/// Where the active key came from. Never carries key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `hmac_secret_key` in settings or the environment
    Configured,
    /// Read from an existing key file
    File(PathBuf),
    /// Generated by this process and written to the key file
    Generated(PathBuf),
}

/// HMAC key material. Debug output is redacted.
#[derive(Debug)]
pub struct SecretKey {
    bytes: SecretSlice<u8>,
    source: KeySource,
}

impl SecretKey {
    /// Use the given bytes as the key.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CacheError> {
        if bytes.is_empty() {
            return Err(CacheError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(Self {
            bytes: SecretSlice::from(bytes),
            source: KeySource::Configured,
        })
    }

    /// Resolve the key for an installation.
    pub fn resolve(settings: &Settings) -> Result<Self, CacheError> {
        match settings.hmac_secret_key.as_deref() {
            Some(configured) if !configured.is_empty() => {
                info!("Using configured HMAC key");
                Self::from_bytes(configured.as_bytes().to_vec())
            }
            Some(_) => {
                warn!("Ignoring empty hmac_secret_key; falling back to key file");
                Self::load_or_generate(&settings.key_path())
            }
            None => Self::load_or_generate(&settings.key_path()),
        }
    }

    /// Load the key stored at `path`, generating and persisting one if
    /// the file does not exist. Safe to call concurrently.
    pub fn load_or_generate(path: &Path) -> Result<Self, CacheError> {
        let key_err = |source| CacheError::KeyFile {
            path: path.to_path_buf(),
            source,
        };

        let _init = match KEY_INIT.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(key_err)?;
        }

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(key_err)?;
        lock_file.lock_exclusive().map_err(key_err)?;

        let result = Self::load_or_generate_locked(path);

        if let Err(e) = FileExt::unlock(&lock_file) {
            warn!(error = %e, "Failed to release key lock");
        }
        result
    }

    fn load_or_generate_locked(path: &Path) -> Result<Self, CacheError> {
        if let Some(bytes) = read_key_file(path)? {
            debug!(path = ?path, "Loaded HMAC key from file");
            return Ok(Self {
                bytes: SecretSlice::from(bytes),
                source: KeySource::File(path.to_path_buf()),
            });
        }

        let mut bytes = vec![0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        write_key_file(path, &bytes)?;
        info!(path = ?path, "Generated new HMAC key");

        Ok(Self {
            bytes: SecretSlice::from(bytes),
            source: KeySource::Generated(path.to_path_buf()),
        })
    }

    pub fn source(&self) -> &KeySource {
        &self.source
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }
}

/// Read a hex-encoded key. `Ok(None)` when the file is absent or unusable.
fn read_key_file(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CacheError::KeyFile {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    match hex::decode(contents.trim()) {
        Ok(bytes) if bytes.len() == KEY_LEN => Ok(Some(bytes)),
        Ok(bytes) => {
            warn!(path = ?path, len = bytes.len(), "Key file has wrong length, regenerating");
            Ok(None)
        }
        Err(e) => {
            warn!(path = ?path, error = %e, "Key file is not valid hex, regenerating");
            Ok(None)
        }
    }
}

/// Write the key via a temp file and rename, owner-readable only.
fn write_key_file(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let key_err = |source| CacheError::KeyFile {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("tmp");
    let mut file = create_private(&tmp_path).map_err(key_err)?;
    file.write_all(hex::encode(bytes).as_bytes())
        .map_err(key_err)?;
    file.sync_all().map_err(key_err)?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(key_err)
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}
