//! Storage Module
//!
//! The persistent key-value store the cache sits on, plus in-memory and
//! file-backed implementations.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;

/// Default byte quota, matching the usual browser local storage budget.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Key-Value Store Trait ==
/// A synchronous string key-value store.
///
/// `keys` enumerates everything in the store, including keys that do not
/// belong to the cache.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;

    /// Removes several keys, returning how many were present.
    ///
    /// Stores with per-write overhead override this to pay it once.
    fn remove_many(&mut self, keys: &[String]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in keys {
            if self.get_raw(key).is_some() {
                self.remove_raw(key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_raw(&self, key: &str) -> Option<String> {
        (**self).get_raw(key)
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_raw(key, value)
    }

    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_raw(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }

    fn remove_many(&mut self, keys: &[String]) -> Result<usize, StorageError> {
        (**self).remove_many(keys)
    }
}

/// Bytes a string occupies when stored as UTF-16.
pub fn storage_size(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

// == Memory Store ==
/// In-memory store with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: BTreeMap<String, String>,
    /// Maximum bytes across keys and values, None = unbounded
    quota: Option<usize>,
    /// Bytes currently used
    used: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes past `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    fn from_entries(entries: BTreeMap<String, String>, quota: Option<usize>) -> Self {
        let used = entries
            .iter()
            .map(|(k, v)| storage_size(k) + storage_size(v))
            .sum();
        Self {
            entries,
            quota,
            used,
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    // == Length ==
    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let replaced = self
            .entries
            .get(key)
            .map(|old| storage_size(key) + storage_size(old))
            .unwrap_or(0);
        let needed = self.used - replaced + storage_size(key) + storage_size(value);

        if let Some(quota) = self.quota {
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        self.used = needed;
        Ok(())
    }

    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError> {
        if let Some(old) = self.entries.remove(key) {
            self.used -= storage_size(key) + storage_size(&old);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

// == File Store ==
/// A [`MemoryStore`] mirrored to a JSON file after every mutation.
///
/// A mutation only becomes visible once the file write succeeds; on an I/O
/// error the store keeps its previous contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>, quota: Option<usize>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<BTreeMap<String, String>>(&contents)
                .map_err(|e| StorageError::Corrupt(e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Opened file store at {} with {} keys", path.display(), entries.len());
        Ok(Self {
            path,
            inner: MemoryStore::from_entries(entries, quota),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `next` to disk, then adopts it as the current contents.
    fn commit(&mut self, next: MemoryStore) -> Result<(), StorageError> {
        let contents = serde_json::to_string(&next.entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        // Write then rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        self.inner = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.inner.get_raw(key)
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut next = self.inner.clone();
        next.set_raw(key, value)?;
        self.commit(next)
    }

    fn remove_raw(&mut self, key: &str) -> Result<(), StorageError> {
        if self.inner.get_raw(key).is_none() {
            return Ok(());
        }
        let mut next = self.inner.clone();
        next.remove_raw(key)?;
        self.commit(next)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn remove_many(&mut self, keys: &[String]) -> Result<usize, StorageError> {
        let mut next = self.inner.clone();
        let removed = next.remove_many(keys)?;
        if removed == 0 {
            return Ok(0);
        }
        self.commit(next)?;
        debug!("Removed {} keys from {}", removed, self.path.display());
        Ok(removed)
    }
}
