//! Persistent key-value storage used for OAuth state and cached resources.
//!
//! The client never talks to a database directly. It reads and writes JSON
//! values under string keys through the [`KeyValueStore`] trait, which the
//! host implements on top of whatever option store it already has.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: a mutex-guarded map, for tests and short-lived processes
//! - [`JsonFileStore`]: a single JSON document on disk, replaced atomically
//!
//! # Example
//!
//! ```rust
//! use convertkit_api::store::{KeyValueStore, MemoryStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.set("convertkit_tags", json!({"1": {"id": 1, "name": "Tag"}})).unwrap();
//! assert!(store.get("convertkit_tags").unwrap().is_some());
//! store.delete("convertkit_tags").unwrap();
//! assert!(store.get("convertkit_tags").unwrap().is_none());
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage could not be read or written.
    #[error("Storage I/O failed for '{path}': {message}")]
    Io {
        /// Location of the backing storage.
        path: String,
        /// Underlying error description.
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("Stored value for '{key}' is corrupt: {message}")]
    Corrupt {
        /// Key (or file) holding the corrupt value.
        key: String,
        /// Decoder error description.
        message: String,
    },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// A persistent string-keyed store of JSON values.
///
/// Implementations must be safe to share between threads; each call is
/// expected to be durable once it returns `Ok`.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Stores several values together.
    ///
    /// Backends that can do so should make this atomic: readers observe
    /// either all of the new values or none of them. The default
    /// implementation writes the entries one by one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(())
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.values.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut values = self.lock()?;
        values.extend(entries);
        Ok(())
    }
}

/// [`KeyValueStore`] persisted as one JSON object in a file.
///
/// Every write rewrites the whole document to a sibling temporary file and
/// renames it over the original, so a crash never leaves a half-written
/// document behind and multi-key writes land together.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (or lazily creates) the store at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Returns the location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, error: &std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: error.to_string(),
        }
    }

    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(&e)),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(&e))?;
            }
        }
        let serialized = serde_json::to_vec(document).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serialized).map_err(|e| self.io_error(&e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&e))
    }

    fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self.guard.lock().map_err(|_| StoreError::Poisoned)?;
        let mut document = self.read_document()?;
        apply(&mut document);
        self.write_document(&document)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard = self.guard.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_document()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.update(|document| {
            document.insert(key.to_string(), value);
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.update(|document| {
            document.remove(key);
        })
    }

    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.update(|document| {
            document.extend(entries);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        let nonce: u64 = rand::random();
        std::env::temp_dir().join(format!("convertkit-store-{name}-{nonce}.json"))
    }

    #[test]
    fn test_memory_store_round_trips_values() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("key", json!({"a": 1})).unwrap();
        assert_eq!(store.get("key").unwrap(), Some(json!({"a": 1})));

        store.delete("key").unwrap();
        assert_eq!(store.get("key").unwrap(), None);
    }

    #[test]
    fn test_memory_store_set_many_writes_all_entries() {
        let store = MemoryStore::new();
        store
            .set_many(vec![
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!(2)),
            ])
            .unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!(1)));
        assert_eq!(store.get("b").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_json_file_store_persists_across_instances() {
        let path = temp_path("persist");
        {
            let store = JsonFileStore::new(&path);
            store
                .set_many(vec![
                    ("convertkit_tags".to_string(), json!({"1": {"id": 1}})),
                    ("convertkit_tags_last_queried".to_string(), json!(1_700_000_000)),
                ])
                .unwrap();
        }

        let reopened = JsonFileStore::new(&path);
        assert_eq!(
            reopened.get("convertkit_tags_last_queried").unwrap(),
            Some(json!(1_700_000_000))
        );
        reopened.delete("convertkit_tags").unwrap();
        assert_eq!(reopened.get("convertkit_tags").unwrap(), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_json_file_store_missing_file_reads_as_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_reports_corrupt_document() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("key"), Err(StoreError::Corrupt { .. })));

        let _ = fs::remove_file(&path);
    }
}
