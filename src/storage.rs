//! Persisted key/value state, the editor's equivalent of browser local storage.
//!
//! All keys live in one JSON object at `<data dir>/state.json`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Key under which the raw editor text is stored.
pub const EDITOR_CONTENT_KEY: &str = "editorContent";

const STATE_FILE: &str = "state.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store in `dir`. A missing or corrupt state file yields an
    /// empty store; the directory is created on first write.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(STATE_FILE);
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "discarding unreadable local state");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "local state not readable");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store `value` under `key` and flush to disk.
    ///
    /// # Errors
    /// Returns an error if the state file cannot be written.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.get(key) == Some(value) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    /// # Errors
    /// Returns an error if the state file cannot be written.
    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&self.entries)?;
        let write_err = |source: io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        // Rename over the old file so readers never see a partial write.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        debug!(path = %self.path.display(), keys = self.entries.len(), "local state flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path());
        store.set(EDITOR_CONTENT_KEY, "hola ñandú\nsegunda línea").unwrap();

        let reopened = LocalStore::open(dir.path());
        assert_eq!(
            reopened.get(EDITOR_CONTENT_KEY),
            Some("hola ñandú\nsegunda línea")
        );
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path());
        store.set(EDITOR_CONTENT_KEY, "first").unwrap();
        store.set(EDITOR_CONTENT_KEY, "second").unwrap();
        assert_eq!(
            LocalStore::open(dir.path()).get(EDITOR_CONTENT_KEY),
            Some("second")
        );
    }

    #[test]
    fn test_missing_dir_is_created_on_write() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut store = LocalStore::open(&nested);
        assert_eq!(store.get(EDITOR_CONTENT_KEY), None);
        store.set("k", "v").unwrap();
        assert!(nested.join(STATE_FILE).exists());
        assert!(!nested.join("state.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_state_starts_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE), "{not json").unwrap();
        let store = LocalStore::open(dir.path());
        assert_eq!(store.get(EDITOR_CONTENT_KEY), None);
    }

    #[test]
    fn test_remove_deletes_key() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::open(dir.path());
        store.set("a", "1").unwrap();
        store.remove("a").unwrap();
        assert_eq!(LocalStore::open(dir.path()).get("a"), None);
    }
}
