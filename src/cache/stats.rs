//! Cache Statistics Module
//!
//! Read-only snapshot of what the cache currently holds in its store.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::Namespace;

// == Cache Stats ==
/// Diagnostic snapshot returned by `TtlCache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of cache-namespaced entries in the store
    pub total_entries: usize,
    /// Estimated size of those entries in KiB, two decimals
    pub total_size_kb: f64,
    /// Entries that are expired or unparseable
    pub expired_count: usize,
    /// Configured entry limit
    pub max_entries: usize,
    /// Entry count per namespace
    pub by_namespace: BTreeMap<Namespace, usize>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates an empty snapshot for a cache limited to `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    // == Record Entry ==
    /// Counts one entry of `size_bytes` in `namespace`.
    pub fn record_entry(&mut self, namespace: Namespace, size_bytes: usize, stale: bool) {
        self.total_entries += 1;
        self.total_size_kb += size_bytes as f64 / 1024.0;
        if stale {
            self.expired_count += 1;
        }
        *self.by_namespace.entry(namespace).or_insert(0) += 1;
    }

    /// Rounds the size estimate to two decimals once every entry is recorded.
    pub fn finish(mut self) -> Self {
        self.total_size_kb = (self.total_size_kb * 100.0).round() / 100.0;
        self
    }

    // == Over Limit ==
    /// Number of entries `enforce_limit` would evict right now.
    pub fn over_limit(&self) -> usize {
        self.total_entries.saturating_sub(self.max_entries)
    }
}
