//! Key/value storage backends for persisted session slots.
//!
//! The durable backend is a directory with one file per key, the native
//! counterpart of browser local storage. `MemoryStorage` is the process-local
//! fallback and the store's authoritative copy.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::error::StorageError;

const PROBE_KEY: &str = "__stocked_probe__";

/// Synchronous string key/value store.
pub trait StorageBackend: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend refuses the write.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend refuses the removal.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Write-read-delete-read round trip proving the backend actually persists.
///
/// # Errors
///
/// Returns the first failing operation's error, or [`StorageError::Mismatch`]
/// if a read does not reflect the preceding write or delete.
pub fn probe(backend: &dyn StorageBackend) -> Result<(), StorageError> {
    let value = format!("probe-{}", std::process::id());
    backend.set_item(PROBE_KEY, &value)?;
    verify_write(backend, PROBE_KEY, &value)?;
    backend.remove_item(PROBE_KEY)?;
    if backend.get_item(PROBE_KEY)?.is_some() {
        return Err(StorageError::Mismatch { key: PROBE_KEY.to_owned() });
    }
    Ok(())
}

/// Read `key` back and compare it with what was just written.
///
/// # Errors
///
/// Returns [`StorageError::Mismatch`] when the stored value differs.
pub fn verify_write(backend: &dyn StorageBackend, key: &str, expected: &str) -> Result<(), StorageError> {
    match backend.get_item(key)? {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(StorageError::Mismatch { key: key.to_owned() }),
    }
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// One file per key under `dir`. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid storage key `{key}`")));
        }
        Ok(self.dir.join(key))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
