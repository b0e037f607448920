//! Cache Module
//!
//! TTL caching over a persistent key-value store with oldest-first eviction.

mod clock;
mod entry;
mod namespace;
mod stats;
mod storage;
mod ttl_cache;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, ParseOutcome};
pub use namespace::{cache_key, decode_key, Namespace, MAX_ENCODED_QUERY_LEN};
pub use stats::CacheStats;
pub use storage::{storage_size, FileStore, KeyValueStore, MemoryStore, DEFAULT_QUOTA_BYTES};
pub use ttl_cache::{CacheConfig, SetOutcome, TtlCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Entry count `enforce_limit` trims down to by default
pub const MAX_CACHE_ENTRIES: usize = 500;

/// Default entry lifetime: 7 days in milliseconds
pub const DEFAULT_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1000;
