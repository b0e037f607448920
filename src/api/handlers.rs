//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, info};

use crate::cache::{CacheStats, FileStore, KeyValueStore, MemoryStore, TtlCache};
use crate::config::Config;
use crate::error::{CacheError, Result, StorageError};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, InvalidateRequest, MaintenanceResponse,
    SetRequest, SetResponse,
};

/// A cache over whichever store the service was configured with.
pub type DynCache = TtlCache<Box<dyn KeyValueStore>>;

/// Application state shared across all handlers.
///
/// Contains the cache wrapped in Arc<RwLock<>> for thread-safe access.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache
    pub cache: Arc<RwLock<DynCache>>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: DynCache) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses a file-backed store when `store_path` is set, memory otherwise.
    pub fn from_config(config: &Config) -> std::result::Result<Self, StorageError> {
        let store: Box<dyn KeyValueStore> = match &config.store_path {
            Some(path) => {
                let store = FileStore::open(path, Some(config.store_quota_bytes))?;
                info!("Using file store at {}", store.path().display());
                Box::new(store)
            }
            None => {
                info!("Using in-memory store");
                Box::new(MemoryStore::with_quota(config.store_quota_bytes))
            }
        };
        Ok(Self::new(TtlCache::new(store, config.cache_config())))
    }

    /// Runs `op` with exclusive access to the cache on the blocking pool.
    ///
    /// File-backed stores write to disk on every mutation, which must not
    /// stall the async workers.
    pub async fn with_cache<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut DynCache) -> T + Send + 'static,
        T: Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || op(&mut cache.blocking_write()))
            .await
            .map_err(|e| CacheError::Internal(e.to_string()))
    }

    /// Runs `op` with shared access to the cache on the blocking pool.
    pub async fn read_cache<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&DynCache) -> T + Send + 'static,
        T: Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || op(&cache.blocking_read()))
            .await
            .map_err(|e| CacheError::Internal(e.to_string()))
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let SetRequest { key, value, ttl_ms } = req;
    let (key, outcome) = state
        .with_cache(move |cache| {
            let outcome = cache.set(&key, &value, ttl_ms);
            (key, outcome)
        })
        .await?;

    Ok(Json(SetResponse::new(key, outcome?)))
}

/// Handler for GET /get/:key
///
/// Retrieves a live value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Exclusive access: an expired hit deletes the entry
    let (key, value) = state
        .with_cache(move |cache| {
            let value = cache.get(&key);
            (key, value)
        })
        .await?;
    let value = value.ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let (key, removed) = state
        .with_cache(move |cache| {
            let removed = cache.remove(&key);
            (key, removed)
        })
        .await?;
    if !removed? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /cleanup
///
/// Removes expired and corrupt entries.
pub async fn cleanup_handler(State(state): State<AppState>) -> Result<Json<MaintenanceResponse>> {
    let removed = state.with_cache(|cache| cache.cleanup()).await?;
    Ok(Json(MaintenanceResponse::new("cleanup", removed)))
}

/// Handler for POST /enforce-limit
///
/// Evicts the oldest entries beyond the configured limit.
pub async fn enforce_limit_handler(
    State(state): State<AppState>,
) -> Result<Json<MaintenanceResponse>> {
    let removed = state.with_cache(|cache| cache.enforce_limit()).await?;
    Ok(Json(MaintenanceResponse::new("enforce-limit", removed)))
}

/// Handler for POST /invalidate
///
/// Removes entries whose decoded query contains the given text.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<MaintenanceResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state
        .with_cache(move |cache| cache.invalidate_matching(&req.substring))
        .await?;
    Ok(Json(MaintenanceResponse::new("invalidate", removed)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<MaintenanceResponse>> {
    let removed = state.with_cache(|cache| cache.clear()).await?;
    Ok(Json(MaintenanceResponse::new("clear", removed)))
}

/// Handler for GET /stats
///
/// Returns a read-only summary of the cache's entries.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    let stats = state.read_cache(|cache| cache.stats()).await?;
    if stats.over_limit() > 0 {
        debug!(
            "Cache holds {} entries over its limit of {}",
            stats.over_limit(),
            stats.max_entries
        );
    }
    Ok(Json(stats))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use serde_json::json;

    fn test_state() -> AppState {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        AppState::new(TtlCache::new(store, CacheConfig::default()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "place_test".to_string(),
            value: json!({"name": "Tokyo Tower"}),
            ttl_ms: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.unwrap().stored);

        let result = get_handler(State(state.clone()), Path("place_test".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.value, json!({"name": "Tokyo Tower"}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("place_nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "route_to_delete".to_string(),
            value: json!("value"),
            ttl_ms: None,
        };
        let _response = set_handler(State(state.clone()), Json(req)).await.unwrap();

        let result = delete_handler(State(state.clone()), Path("route_to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state), Path("route_to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_maintenance_handlers() {
        let state = test_state();
        state
            .cache
            .write()
            .await
            .store_mut()
            .set_raw("place_broken", "not json")
            .unwrap();

        assert_eq!(cleanup_handler(State(state.clone())).await.unwrap().removed, 1);
        assert_eq!(enforce_limit_handler(State(state.clone())).await.unwrap().removed, 0);
        assert_eq!(clear_handler(State(state)).await.unwrap().removed, 0);
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = test_state();
        let req = SetRequest {
            key: "place_Kyoto%20Station".to_string(),
            value: json!(1),
            ttl_ms: None,
        };
        let _response = set_handler(State(state.clone()), Json(req)).await.unwrap();

        let req = InvalidateRequest {
            substring: "kyoto station".to_string(),
        };
        let response = invalidate_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.removed, 1);
    }

    #[tokio::test]
    async fn test_invalidate_rejects_blank() {
        let req = InvalidateRequest {
            substring: "".to_string(),
        };
        let result = invalidate_handler(State(test_state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await.unwrap();
        assert_eq!(response.total_entries, 0);
        assert_eq!(response.max_entries, 500);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl_ms: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_config_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store_path: Some(dir.path().join("cache.json")),
            ..Config::default()
        };
        assert!(AppState::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_handlers_over_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let config = Config {
            store_path: Some(path.clone()),
            ..Config::default()
        };
        let state = AppState::from_config(&config).unwrap();

        for key in ["place_a", "place_b", "route_c"] {
            let req = SetRequest {
                key: key.to_string(),
                value: json!(key),
                ttl_ms: None,
            };
            assert!(set_handler(State(state.clone()), Json(req)).await.unwrap().stored);
        }
        assert_eq!(clear_handler(State(state)).await.unwrap().removed, 3);

        let reopened = FileStore::open(&path, None).unwrap();
        assert!(reopened.keys().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_key_rejected() {
        let state = test_state();
        state
            .cache
            .write()
            .await
            .store_mut()
            .set_raw("trip_itinerary", "{}")
            .unwrap();

        let req = SetRequest {
            key: "trip_itinerary".to_string(),
            value: json!(1),
            ttl_ms: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

        let result = get_handler(State(state.clone()), Path("trip_itinerary".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));

        let result = delete_handler(State(state.clone()), Path("trip_itinerary".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
        assert!(state.cache.read().await.store().get_raw("trip_itinerary").is_some());
    }
}
