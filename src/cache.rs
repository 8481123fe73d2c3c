//! Key-value storage for fetched reports.
//!
//! The provider reads through and writes through a [`ReportCache`] under the
//! key produced by [`cache_key`].  Entries never expire; a write replaces the
//! previous value for the key in full.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use thiserror::Error;

/// Prefix shared by every report cache key.
pub const CACHE_KEY_PREFIX: &str = "reportData_";

const ENTRY_EXTENSION: &str = "json";

/// Returns the cache key for a student's report.
pub fn cache_key(student_id: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, student_id)
}

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache entry at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cache entry at {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A string key-value store holding serialized reports.
pub trait ReportCache {
    /// Returns the stored value, or `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value`, replacing any previous value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

impl<C: ReportCache + ?Sized> ReportCache for &C {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }
}

impl<C: ReportCache + ?Sized> ReportCache for Arc<C> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }
}

/// In-process cache, shareable between providers through an [`Arc`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persistent cache storing one JSON file per key inside a directory.
///
/// Keys are percent-encoded into file names, so any student identifier maps
/// to a distinct file.  Writes go through a temporary file and a rename so a
/// reader never observes a partially written entry.
#[derive(Clone, Debug)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", encode_file_name(key, b"_-"), ENTRY_EXTENSION))
    }
}

impl ReportCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                debug!("Cache hit for {} at {}", key, path.display());
                Ok(Some(contents))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("Cache miss for {}", key);
                Ok(None)
            }
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let staging = path.with_extension("tmp");
        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(write_err)?;
        fs::write(&staging, value).map_err(write_err)?;
        fs::rename(&staging, &path).map_err(write_err)?;
        debug!("Stored {} at {}", key, path.display());
        Ok(())
    }
}

/// Percent-encodes every byte of `name` except ASCII alphanumerics and `keep`.
pub(crate) fn encode_file_name(name: &str, keep: &[u8]) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || keep.contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}
