//! TTL Cache Module
//!
//! Main cache engine: TTL-wrapped values over an injected key-value store,
//! with expired-entry cleanup and oldest-first limit enforcement.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{
    decode_key, storage_size, CacheEntry, CacheStats, Clock, KeyValueStore, Namespace,
    ParseOutcome, SystemClock, DEFAULT_TTL_MS, MAX_CACHE_ENTRIES, MAX_KEY_LENGTH,
};
use crate::error::{CacheError, Result};

// == Cache Config ==
/// Tunables for a [`TtlCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Entry count `enforce_limit` trims down to
    pub max_entries: usize,
    /// TTL in milliseconds for writes that don't pass one
    pub default_ttl_ms: u64,
    /// Namespaces whose keys the cache owns
    pub namespaces: Vec<Namespace>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_CACHE_ENTRIES,
            default_ttl_ms: DEFAULT_TTL_MS,
            namespaces: Namespace::ALL.to_vec(),
        }
    }
}

// == Set Outcome ==
/// What happened to a `set` call. Writes never fail the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Written on the first attempt
    Stored,
    /// Written after a cleanup pass freed space
    StoredAfterCleanup,
    /// Not written; the cache degrades to a no-op for this value
    Dropped,
}

impl SetOutcome {
    pub fn is_stored(self) -> bool {
        !matches!(self, SetOutcome::Dropped)
    }
}

// == TTL Cache ==
/// Self-expiring, size-bounded cache over a [`KeyValueStore`].
///
/// All state lives in the store; the cache itself only holds configuration.
pub struct TtlCache<S> {
    /// Underlying key-value store
    store: S,
    /// Time source for write stamps and expiry checks
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl<S: KeyValueStore> TtlCache<S> {
    // == Constructor ==
    /// Creates a cache over `store` using wall-clock time.
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit time source.
    ///
    /// A zero `default_ttl_ms` or `max_entries` falls back to the built-in
    /// default.
    pub fn with_clock(store: S, mut config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        if config.default_ttl_ms == 0 {
            warn!("Default TTL of 0 ms ignored, using {} ms", DEFAULT_TTL_MS);
            config.default_ttl_ms = DEFAULT_TTL_MS;
        }
        if config.max_entries == 0 {
            warn!("Entry limit of 0 ignored, using {}", MAX_CACHE_ENTRIES);
            config.max_entries = MAX_CACHE_ENTRIES;
        }
        Self {
            store,
            clock,
            config,
        }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrows the underlying store, bypassing TTL wrapping.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are deleted and read as a miss. Values written without
    /// TTL metadata are returned as-is. Unparseable values read as a miss but
    /// stay in the store until `cleanup` runs. Keys outside the cache's
    /// namespaces always miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.namespace_of(key)?;
        let raw = self.store.get_raw(key)?;

        match ParseOutcome::parse(&raw) {
            ParseOutcome::Wrapped(entry) => {
                let now = self.clock.now_ms();
                if entry.is_expired(now) {
                    debug!("Cache entry '{}' expired", key);
                    self.remove_quietly(key);
                    None
                } else {
                    debug!(
                        "Cache hit for '{}', {} ms left",
                        key,
                        entry.ttl_remaining_ms(now)
                    );
                    Some(entry.data)
                }
            }
            ParseOutcome::Legacy(value) => Some(value),
            ParseOutcome::Invalid => {
                debug!("Cache entry '{}' is not valid JSON, treating as miss", key);
                None
            }
        }
    }

    /// Retrieves a live value and deserializes it into `T`.
    ///
    /// A payload of the wrong shape reads as a miss.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!("Cache entry '{}' has unexpected shape: {}", key, e);
                None
            }
        }
    }

    // == Set ==
    /// Stores a value with an optional TTL in milliseconds.
    ///
    /// Overwrites any entry at `key`. When the store is full, runs `cleanup`
    /// and retries once; if that also fails the write is dropped. Only
    /// malformed arguments are reported as errors, including keys outside
    /// the cache's namespaces.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        ttl_ms: Option<u64>,
    ) -> Result<SetOutcome> {
        validate_key(key)?;
        if self.namespace_of(key).is_none() {
            return Err(CacheError::InvalidRequest(format!(
                "Key '{}' is outside the cache namespaces",
                key
            )));
        }
        let ttl = ttl_ms.unwrap_or(self.config.default_ttl_ms);
        if ttl == 0 {
            return Err(CacheError::InvalidRequest(
                "TTL must be greater than zero".to_string(),
            ));
        }

        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("Dropping cache write for '{}': {}", key, e);
                return Ok(SetOutcome::Dropped);
            }
        };
        let entry = CacheEntry::new(data, self.clock.now_ms(), ttl);
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dropping cache write for '{}': {}", key, e);
                return Ok(SetOutcome::Dropped);
            }
        };

        match self.store.set_raw(key, &raw) {
            Ok(()) => Ok(SetOutcome::Stored),
            Err(e) if e.is_quota_exceeded() => {
                let removed = self.cleanup();
                debug!(
                    "Store full writing '{}', cleanup removed {} entries; retrying",
                    key, removed
                );
                match self.store.set_raw(key, &raw) {
                    Ok(()) => Ok(SetOutcome::StoredAfterCleanup),
                    Err(e) => {
                        warn!("Dropping cache write for '{}' after cleanup: {}", key, e);
                        Ok(SetOutcome::Dropped)
                    }
                }
            }
            Err(e) => {
                warn!("Dropping cache write for '{}': {}", key, e);
                Ok(SetOutcome::Dropped)
            }
        }
    }

    // == Remove ==
    /// Removes an entry by key, returning whether it existed.
    ///
    /// Keys outside the cache's namespaces are never touched.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if self.namespace_of(key).is_none() || self.store.get_raw(key).is_none() {
            return Ok(false);
        }
        self.store.remove_raw(key)?;
        Ok(true)
    }

    // == Cleanup ==
    /// Removes every expired or unparseable cache entry.
    ///
    /// Entries without TTL metadata are kept. Returns the number removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let stale: Vec<String> = self
            .cache_keys()
            .into_iter()
            .filter(|key| {
                self.store
                    .get_raw(key)
                    .is_some_and(|raw| ParseOutcome::parse(&raw).is_stale(now))
            })
            .collect();

        let removed = self.remove_all(&stale);
        if removed > 0 {
            debug!("Cleanup removed {} stale cache entries", removed);
        }
        removed
    }

    // == Enforce Limit ==
    /// Evicts the oldest entries until at most `max_entries` remain.
    ///
    /// Age is write time, so this approximates LRU without tracking reads.
    /// Entries without a readable timestamp count as the oldest. Returns the
    /// number removed.
    pub fn enforce_limit(&mut self) -> usize {
        let mut aged: Vec<(u64, String)> = self
            .cache_keys()
            .into_iter()
            .filter_map(|key| {
                let raw = self.store.get_raw(&key)?;
                Some((ParseOutcome::parse(&raw).eviction_timestamp(), key))
            })
            .collect();

        if aged.len() <= self.config.max_entries {
            return 0;
        }

        aged.sort();
        let excess = aged.len() - self.config.max_entries;
        let oldest: Vec<String> = aged.into_iter().take(excess).map(|(_, key)| key).collect();

        let removed = self.remove_all(&oldest);
        debug!(
            "Limit enforcement evicted {} entries (max {})",
            removed, self.config.max_entries
        );
        removed
    }

    // == Invalidate Matching ==
    /// Removes entries whose decoded query contains `needle`, ignoring case.
    ///
    /// An empty needle matches nothing.
    pub fn invalidate_matching(&mut self, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let needle = needle.to_lowercase();

        let matching: Vec<String> = self
            .cache_keys()
            .into_iter()
            .filter(|key| {
                decode_key(key).is_some_and(|(_, query)| query.to_lowercase().contains(&needle))
            })
            .collect();

        let removed = self.remove_all(&matching);
        debug!("Invalidated {} entries matching '{}'", removed, needle);
        removed
    }

    // == Clear ==
    /// Removes every cache entry, leaving other keys in the store alone.
    pub fn clear(&mut self) -> usize {
        let keys = self.cache_keys();
        self.remove_all(&keys)
    }

    // == Stats ==
    /// Summarizes the cache's entries without modifying anything.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let mut stats = CacheStats::new(self.config.max_entries);

        for key in self.store.keys() {
            let Some(namespace) = self.namespace_of(&key) else {
                continue;
            };
            let Some(raw) = self.store.get_raw(&key) else {
                continue;
            };
            let stale = ParseOutcome::parse(&raw).is_stale(now);
            stats.record_entry(namespace, storage_size(&raw), stale);
        }

        stats.finish()
    }

    // == Length ==
    /// Returns the number of cache-namespaced keys in the store.
    pub fn len(&self) -> usize {
        self.cache_keys().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn namespace_of(&self, key: &str) -> Option<Namespace> {
        self.config
            .namespaces
            .iter()
            .copied()
            .find(|ns| ns.owns(key))
    }

    fn cache_keys(&self) -> Vec<String> {
        self.store
            .keys()
            .into_iter()
            .filter(|key| self.namespace_of(key).is_some())
            .collect()
    }

    /// Removes `keys` in one store batch, returning how many are gone.
    fn remove_all(&mut self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        match self.store.remove_many(keys) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Failed to remove {} cache entries: {}", keys.len(), e);
                // The batch may have been partly applied
                keys.iter()
                    .filter(|key| self.store.get_raw(key).is_none())
                    .count()
            }
        }
    }

    fn remove_quietly(&mut self, key: &str) -> bool {
        match self.store.remove_raw(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to remove cache entry '{}': {}", key, e);
                false
            }
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
