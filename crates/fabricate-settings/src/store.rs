//! Settings storage.
//!
//! This module provides:
//! - The `SettingsStore` capability: JSON values keyed by setting path
//! - An in-memory store for tests and embedding
//! - A store backed by a single pretty-printed JSON document on disk

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// A stored value does not have the expected shape.
    #[error("Invalid value for setting \"{key}\": {reason}")]
    InvalidValue {
        /// Setting key.
        key: String,
        /// What was wrong.
        reason: String,
    },

    /// The settings document is not a JSON object.
    #[error("Settings document {0} is not a JSON object")]
    InvalidDocument(PathBuf),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Read/write access to settings keyed by setting path.
pub trait SettingsStore {
    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> SettingsResult<()>;

    /// Removes `key`. Absent keys are ignored.
    fn delete(&mut self, key: &str) -> SettingsResult<()>;
}

/// Typed access on top of [`SettingsStore`].
pub trait SettingsStoreExt: SettingsStore {
    /// Deserializes the value under `key`.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> SettingsResult<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| SettingsError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Serializes `value` and stores it under `key`.
    fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> SettingsResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value)
    }
}

impl<S: SettingsStore + ?Sized> SettingsStoreExt for S {}

/// Settings held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemorySettingsStore {
    values: BTreeMap<String, Value>,
}

impl InMemorySettingsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SettingsStore::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Stored keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> SettingsResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> SettingsResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Settings persisted as one JSON object on disk.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    document: Map<String, Value>,
    dirty: bool,
    auto_save: bool,
}

impl JsonFileSettingsStore {
    /// Creates an empty store for `path`. Nothing is read until [`Self::load`].
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            document: Map::new(),
            dirty: false,
            auto_save: false,
        }
    }

    /// Creates a store for `path` and loads it.
    pub fn open(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let mut store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    /// Saves after every write when enabled.
    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if there are unsaved writes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reads the document. A missing file yields an empty document.
    pub fn load(&mut self) -> SettingsResult<()> {
        if !self.path.exists() {
            info!("Settings file {} not found, starting empty", self.path.display());
            self.document = Map::new();
            self.dirty = false;
            return Ok(());
        }

        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents)? {
            Value::Object(document) => self.document = document,
            _ => return Err(SettingsError::InvalidDocument(self.path.clone())),
        }
        self.dirty = false;

        info!("Settings loaded from {}", self.path.display());
        Ok(())
    }

    /// Writes the document.
    pub fn save(&mut self) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, json)?;
        self.dirty = false;

        info!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Saves if there are unsaved writes.
    pub fn save_if_dirty(&mut self) -> SettingsResult<()> {
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }

    fn touch(&mut self) -> SettingsResult<()> {
        self.dirty = true;
        if self.auto_save {
            self.save()?;
        }
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.document.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> SettingsResult<()> {
        debug!(key, "Writing setting");
        self.document.insert(key.to_string(), value);
        self.touch()
    }

    fn delete(&mut self, key: &str) -> SettingsResult<()> {
        if self.document.remove(key).is_some() {
            debug!(key, "Deleted setting");
            self.touch()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_get_set_delete() {
        let mut store = InMemorySettingsStore::new();
        assert!(store.get("modelVersion").is_none());

        store.set("modelVersion", json!("V3")).expect("set");
        assert_eq!(store.get("modelVersion"), Some(json!("V3")));

        store.delete("modelVersion").expect("delete");
        store.delete("modelVersion").expect("delete absent");
        assert!(store.is_empty());
    }

    #[test]
    fn test_typed_access() {
        let mut store = InMemorySettingsStore::new();
        store.set_as("counts", &vec![1u32, 2, 3]).expect("set");
        let counts: Option<Vec<u32>> = store.get_as("counts").expect("get");
        assert_eq!(counts, Some(vec![1, 2, 3]));

        store.set("counts", json!("nope")).expect("set");
        let result: SettingsResult<Option<Vec<u32>>> = store.get_as("counts");
        assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonFileSettingsStore::open(&path).expect("open missing");
        store.set("modelVersion", json!("V3")).expect("set");
        assert!(store.is_dirty());
        store.save().expect("save");
        assert!(!store.is_dirty());

        let reopened = JsonFileSettingsStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("modelVersion"), Some(json!("V3")));
    }

    #[test]
    fn test_file_store_auto_save() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");

        let mut store = JsonFileSettingsStore::new(&path);
        store.set_auto_save(true);
        store.set("a", json!(1)).expect("set");
        assert!(!store.is_dirty());
        assert!(path.exists());
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2]").expect("write");

        assert!(matches!(
            JsonFileSettingsStore::open(&path),
            Err(SettingsError::InvalidDocument(_))
        ));
    }
}
