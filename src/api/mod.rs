//! API Module
//!
//! HTTP handlers and routing that expose the cache to the trip planner's API client.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /cleanup`, `/enforce-limit`, `/invalidate`, `/clear` - Maintenance
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
