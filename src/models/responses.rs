//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::SetOutcome;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The cached value
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Human-readable result
    pub message: String,
    /// The key that was set
    pub key: String,
    /// False when the write was dropped for lack of space
    pub stored: bool,
}

impl SetResponse {
    /// Creates a new SetResponse describing `outcome`
    pub fn new(key: impl Into<String>, outcome: SetOutcome) -> Self {
        let key = key.into();
        let message = match outcome {
            SetOutcome::Stored => format!("Key '{}' set successfully", key),
            SetOutcome::StoredAfterCleanup => {
                format!("Key '{}' set successfully after cleanup", key)
            }
            SetOutcome::Dropped => format!("Key '{}' not cached: store is full", key),
        };
        Self {
            message,
            key,
            stored: outcome.is_stored(),
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for maintenance operations (cleanup, enforce-limit, invalidate, clear)
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    /// Name of the operation that ran
    pub operation: &'static str,
    /// Number of entries removed
    pub removed: usize,
}

impl MaintenanceResponse {
    pub fn new(operation: &'static str, removed: usize) -> Self {
        Self { operation, removed }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
