//! Device-local persistence for store snapshots.
//!
//! Each store owns one key and writes its whole state after every mutation.
//! Values are wrapped in a [`Snapshot`] envelope carrying a schema version;
//! anything that does not match the current version is dropped on load and
//! the store starts from its defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key for the cart lines.
pub const CART_KEY: &str = "cart-storage";
/// Storage key for the checkout draft.
pub const CHECKOUT_KEY: &str = "checkout-storage";
/// Storage key for the signed-in user cache.
pub const AUTH_KEY: &str = "auth-storage";

/// Current snapshot schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from the local key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Keys are limited to lowercase letters, digits and dashes.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A string-keyed store on the shopper's device.
pub trait LocalStorage: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Snapshot envelope
// =============================================================================

/// Versioned wrapper around a persisted store state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Schema version the data was written with.
    pub version: u32,
    /// The store state.
    pub data: T,
}

#[derive(Deserialize)]
struct RawSnapshot {
    version: u32,
    data: serde_json::Value,
}

/// Write `data` under `key` at the current schema version.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn save_snapshot<T: Serialize>(
    storage: &dyn LocalStorage,
    key: &str,
    data: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(&Snapshot {
        version: SCHEMA_VERSION,
        data,
    })?;
    storage.set(key, &raw)
}

/// Write a snapshot, logging instead of failing.
///
/// Stores call this after every mutation; a failed write leaves the in-memory
/// state authoritative until the next successful one.
pub fn persist<T: Serialize>(storage: &dyn LocalStorage, key: &str, data: &T) {
    if let Err(e) = save_snapshot(storage, key, data) {
        warn!(key, error = %e, "Failed to persist snapshot");
    }
}

/// Load the snapshot under `key`.
///
/// Returns `None` when nothing is stored, the stored version differs from
/// [`SCHEMA_VERSION`], or the value cannot be parsed. Unusable values are
/// removed so they are not reported again.
pub fn load_snapshot<T: DeserializeOwned>(storage: &dyn LocalStorage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read snapshot");
            return None;
        }
    };

    let parsed = serde_json::from_str::<RawSnapshot>(&raw).map_err(|e| e.to_string());
    let result = parsed.and_then(|snapshot| {
        if snapshot.version == SCHEMA_VERSION {
            serde_json::from_value::<T>(snapshot.data).map_err(|e| e.to_string())
        } else {
            Err(format!(
                "schema version {} does not match {SCHEMA_VERSION}",
                snapshot.version
            ))
        }
    });

    match result {
        Ok(data) => {
            debug!(key, "Restored snapshot");
            Some(data)
        }
        Err(reason) => {
            warn!(key, reason = %reason, "Discarding unusable snapshot");
            if let Err(e) = storage.remove(key) {
                warn!(key, error = %e, "Failed to remove unusable snapshot");
            }
            None
        }
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files under `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(io_error(key))?;

        // Readers only ever see a complete file.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(io_error(key))?;
        std::fs::rename(&tmp, &path).map_err(io_error(key))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}
