//! Cache Entry Module
//!
//! Defines the persisted shape of a cache entry and how raw stored strings
//! are classified when read back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A TTL-wrapped value as written to the store.
///
/// Persisted as `{ "data": <value>, "timestamp": <ms>, "ttl": <ms> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload
    pub data: Value,
    /// Write time (Unix milliseconds)
    pub timestamp: u64,
    /// Lifetime in milliseconds
    pub ttl: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Wraps `data` with a write time and lifetime.
    pub fn new(data: Value, timestamp: u64, ttl: u64) -> Self {
        Self {
            data,
            timestamp,
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired only once strictly more than `ttl` milliseconds have
    /// passed since it was written; at exactly `ttl` it is still live. A write
    /// time in the future counts as zero elapsed time.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) > self.ttl
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.ttl.saturating_sub(now_ms.saturating_sub(self.timestamp))
    }
}

// == Parse Outcome ==
/// Classification of a raw stored string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A TTL-wrapped entry
    Wrapped(CacheEntry),
    /// Valid JSON written without TTL metadata; never expires
    Legacy(Value),
    /// Not JSON at all
    Invalid,
}

impl ParseOutcome {
    /// Classifies a raw stored string.
    ///
    /// An object is `Wrapped` when it carries numeric `timestamp` and `ttl`
    /// fields; a missing `data` field reads as `null`. Fractional numbers are
    /// truncated and negative ones read as `0`, so `ttl: -1` expires as soon as
    /// any time passes. Every other JSON value is `Legacy`.
    pub fn parse(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => return ParseOutcome::Invalid,
        };

        let metadata = value.as_object().and_then(|obj| {
            let timestamp = millis(obj.get("timestamp")?)?;
            let ttl = millis(obj.get("ttl")?)?;
            Some((timestamp, ttl))
        });

        match metadata {
            Some((timestamp, ttl)) => {
                let data = match value {
                    Value::Object(mut obj) => obj.remove("data").unwrap_or(Value::Null),
                    _ => Value::Null,
                };
                ParseOutcome::Wrapped(CacheEntry::new(data, timestamp, ttl))
            }
            None => ParseOutcome::Legacy(value),
        }
    }

    /// Write time used to order entries for eviction.
    ///
    /// Anything that is not a wrapped entry sorts as the oldest possible.
    pub fn eviction_timestamp(&self) -> u64 {
        match self {
            ParseOutcome::Wrapped(entry) => entry.timestamp,
            ParseOutcome::Legacy(_) | ParseOutcome::Invalid => 0,
        }
    }

    /// Returns true for entries `cleanup` should purge: expired or unparseable.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        match self {
            ParseOutcome::Wrapped(entry) => entry.is_expired(now_ms),
            ParseOutcome::Legacy(_) => false,
            ParseOutcome::Invalid => true,
        }
    }
}

/// Reads a JSON number as whole milliseconds, clamping negatives to zero.
fn millis(value: &Value) -> Option<u64> {
    if let Some(ms) = value.as_u64() {
        return Some(ms);
    }
    let ms = value.as_f64()?;
    if !ms.is_finite() {
        return None;
    }
    // `as` saturates: negatives become 0 and huge values u64::MAX
    Some(ms.trunc() as u64)
}
