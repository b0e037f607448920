//! Trip Cache - TTL caching for trip-planner place and map lookups
//!
//! Wraps a persistent key-value store with per-entry expiry and oldest-first
//! eviction, and exposes it over a small HTTP API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, SetOutcome, TtlCache};
pub use config::Config;
pub use tasks::spawn_maintenance_task;
