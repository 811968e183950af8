//! On-disk cache generations.
//!
//! Each generation is a directory under the storage root. An entry is two
//! files named after the SHA-256 of its URL: `<hash>.body` with the raw
//! response body and `<hash>.json` with the URL, status and content type.
//! Lookups are exact-URL; there is no expiry and no revalidation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use super::fetch::Response;

const STAGING_PREFIX: &str = ".staging-";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache name {0:?}")]
    InvalidName(String),
    #[error("cache i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt cache entry {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    content_type: Option<String>,
}

/// All cache generations under one root directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the generations currently stored, sorted.
    ///
    /// # Errors
    /// Returns an error if the root exists but cannot be listed.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(&self.root)(err)),
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|ft| ft.is_dir()))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn has(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.root.join(name).is_dir()
    }

    /// # Errors
    /// Returns an error for names that cannot be used as a directory name.
    pub fn open(&self, name: &str) -> Result<Cache, CacheError> {
        validate_name(name)?;
        Ok(Cache {
            name: name.to_string(),
            dir: self.root.join(name),
        })
    }

    /// Delete a generation. Returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be removed.
    pub fn delete(&self, name: &str) -> Result<bool, CacheError> {
        validate_name(name)?;
        let dir = self.root.join(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(&dir)(err)),
        }
    }

    /// Store `responses` as generation `name` in one step.
    ///
    /// Entries are written to a staging directory first and renamed into
    /// place, so the generation appears complete or not at all.
    ///
    /// # Errors
    /// Returns an error if any entry cannot be written; the staging
    /// directory is removed in that case.
    pub fn put_all(&self, name: &str, responses: &[Response]) -> Result<Cache, CacheError> {
        validate_name(name)?;
        let staging = self.root.join(format!("{STAGING_PREFIX}{name}"));
        let target = self.root.join(name);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(io_err(&staging))?;
        }
        fs::create_dir_all(&staging).map_err(io_err(&staging))?;

        let written = responses
            .iter()
            .try_for_each(|response| write_entry(&staging, response))
            .and_then(|()| {
                if target.exists() {
                    fs::remove_dir_all(&target).map_err(io_err(&target))?;
                }
                fs::rename(&staging, &target).map_err(io_err(&target))
            });
        if let Err(err) = written {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }
        debug!(cache = name, entries = responses.len(), "cache generation written");
        self.open(name)
    }
}

/// One cache generation.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    dir: PathBuf,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for exactly `url`.
    ///
    /// # Errors
    /// Returns an error if an entry exists but cannot be read back.
    pub fn match_url(&self, url: &str) -> Result<Option<Response>, CacheError> {
        let key = entry_key(url);
        let meta_path = self.dir.join(format!("{key}.json"));
        let meta_bytes = match fs::read(&meta_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(&meta_path)(err)),
        };
        let meta: EntryMeta =
            serde_json::from_slice(&meta_bytes).map_err(|source| CacheError::Corrupt {
                path: meta_path.clone(),
                source,
            })?;
        if meta.url != url {
            return Ok(None);
        }
        let body_path = self.dir.join(format!("{key}.body"));
        let body = fs::read(&body_path).map_err(io_err(&body_path))?;
        Ok(Some(Response {
            url: meta.url,
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    /// URLs stored in this generation, sorted.
    ///
    /// # Errors
    /// Returns an error if the generation cannot be listed.
    pub fn urls(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(&self.dir)(err)),
        };
        let mut urls = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = fs::read(&path).map_err(io_err(&path))?;
            let meta: EntryMeta = serde_json::from_slice(&bytes)
                .map_err(|source| CacheError::Corrupt { path, source })?;
            urls.push(meta.url);
        }
        urls.sort();
        Ok(urls)
    }
}

fn write_entry(dir: &Path, response: &Response) -> Result<(), CacheError> {
    let key = entry_key(&response.url);
    let meta = EntryMeta {
        url: response.url.clone(),
        status: response.status,
        content_type: response.content_type.clone(),
    };
    let meta_path = dir.join(format!("{key}.json"));
    let body_path = dir.join(format!("{key}.body"));
    let meta_bytes = serde_json::to_vec(&meta).map_err(|source| CacheError::Corrupt {
        path: meta_path.clone(),
        source,
    })?;
    fs::write(&body_path, &response.body).map_err(io_err(&body_path))?;
    fs::write(&meta_path, meta_bytes).map_err(io_err(&meta_path))
}

fn entry_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn validate_name(name: &str) -> Result<(), CacheError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn response(url: &str, body: &str) -> Response {
        Response {
            url: url.to_string(),
            status: 200,
            content_type: Some("text/css".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_put_all_then_match_exact_url() {
        let dir = tempdir().unwrap();
        let storage = CacheStorage::new(dir.path());
        let cache = storage
            .put_all("v1", &[response("https://site.test/style.css", "body{}")])
            .unwrap();

        let hit = cache.match_url("https://site.test/style.css").unwrap().unwrap();
        assert_eq!(hit.body, b"body{}");
        assert_eq!(hit.content_type.as_deref(), Some("text/css"));
        assert!(cache.match_url("https://site.test/style.css?v=2").unwrap().is_none());
    }

    #[test]
    fn test_keys_lists_generations_and_hides_staging() {
        let dir = tempdir().unwrap();
        let storage = CacheStorage::new(dir.path());
        assert!(storage.keys().unwrap().is_empty());
        storage.put_all("b-v2", &[]).unwrap();
        storage.put_all("a-v1", &[]).unwrap();
        fs::create_dir_all(dir.path().join(".staging-c")).unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["a-v1", "b-v2"]);
    }

    #[test]
    fn test_delete_reports_existence() {
        let dir = tempdir().unwrap();
        let storage = CacheStorage::new(dir.path());
        storage.put_all("old", &[]).unwrap();
        assert!(storage.delete("old").unwrap());
        assert!(!storage.delete("old").unwrap());
        assert!(!storage.has("old"));
    }

    #[test]
    fn test_put_all_replaces_existing_generation() {
        let dir = tempdir().unwrap();
        let storage = CacheStorage::new(dir.path());
        storage
            .put_all("v1", &[response("https://a.test/x", "old")])
            .unwrap();
        let cache = storage
            .put_all("v1", &[response("https://a.test/y", "new")])
            .unwrap();
        assert_eq!(cache.urls().unwrap(), vec!["https://a.test/y"]);
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let storage = CacheStorage::new("unused");
        assert!(storage.open("../escape").is_err());
        assert!(storage.open(".hidden").is_err());
        assert!(storage.open("").is_err());
        assert!(storage.open("textpad-v1").is_ok());
    }

    #[test]
    fn test_entry_key_is_hex_sha256() {
        let key = entry_key("https://a.test/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
