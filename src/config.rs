//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::cache::{CacheConfig, Namespace, DEFAULT_QUOTA_BYTES, DEFAULT_TTL_MS, MAX_CACHE_ENTRIES};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Entry count limit enforcement trims down to
    pub max_entries: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// JSON file backing the store, None = in-memory only
    pub store_path: Option<PathBuf>,
    /// Byte quota of the store
    pub store_quota_bytes: usize,
    /// Maintenance task interval in seconds, 0 = disabled
    pub maintenance_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_ENTRIES` - Entry limit (default: 500)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 7 days)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_PATH` - Backing JSON file (default: unset, in-memory)
    /// - `STORE_QUOTA_BYTES` - Store quota (default: 5 MiB)
    /// - `MAINTENANCE_INTERVAL` - Maintenance frequency in seconds (default: 0, off)
    ///
    /// Zero is not a usable entry limit, TTL or quota; those fall back to
    /// their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_positive("MAX_CACHE_ENTRIES", defaults.max_entries),
            default_ttl_ms: env_positive("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            store_path: env::var("STORE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            store_quota_bytes: env_positive("STORE_QUOTA_BYTES", defaults.store_quota_bytes),
            maintenance_interval: env_or("MAINTENANCE_INTERVAL", defaults.maintenance_interval),
        }
    }

    /// Cache settings derived from this configuration.
    ///
    /// Namespaces are fixed and always include every bucket.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_entries,
            default_ttl_ms: self.default_ttl_ms,
            namespaces: Namespace::ALL.to_vec(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_positive<T: FromStr + PartialOrd + Default + Copy>(name: &str, default: T) -> T {
    let value = env_or(name, default);
    if value > T::default() {
        value
    } else {
        warn!("{} must be greater than zero, using the default", name);
        default
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: MAX_CACHE_ENTRIES,
            default_ttl_ms: DEFAULT_TTL_MS,
            server_port: 3000,
            store_path: None,
            store_quota_bytes: DEFAULT_QUOTA_BYTES,
            maintenance_interval: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.default_ttl_ms, 604_800_000);
        assert_eq!(config.server_port, 3000);
        assert!(config.store_path.is_none());
        assert_eq!(config.store_quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.maintenance_interval, 0);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("MAX_CACHE_ENTRIES");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("SERVER_PORT");
        env::remove_var("STORE_PATH");
        env::remove_var("STORE_QUOTA_BYTES");
        env::remove_var("MAINTENANCE_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.default_ttl_ms, 604_800_000);
        assert_eq!(config.server_port, 3000);
        assert!(config.store_path.is_none());
        assert_eq!(config.maintenance_interval, 0);
    }

    #[test]
    fn test_config_from_env_ignores_zero() {
        env::set_var("MAX_CACHE_ENTRIES", "0");
        env::set_var("DEFAULT_TTL_MS", "0");
        env::set_var("STORE_QUOTA_BYTES", "0");

        let config = Config::from_env();

        env::remove_var("MAX_CACHE_ENTRIES");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("STORE_QUOTA_BYTES");

        assert_eq!(config.max_entries, MAX_CACHE_ENTRIES);
        assert_eq!(config.default_ttl_ms, DEFAULT_TTL_MS);
        assert_eq!(config.store_quota_bytes, DEFAULT_QUOTA_BYTES);
    }

    #[test]
    fn test_cache_config_covers_all_namespaces() {
        let config = Config {
            max_entries: 42,
            ..Config::default()
        };
        let cache_config = config.cache_config();

        assert_eq!(cache_config.max_entries, 42);
        assert_eq!(cache_config.default_ttl_ms, DEFAULT_TTL_MS);
        assert_eq!(cache_config.namespaces, Namespace::ALL.to_vec());
    }
}
