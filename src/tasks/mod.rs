//! Background Tasks Module
//!
//! Contains background tasks that may run periodically during server operation.
//!
//! # Tasks
//! - Maintenance: cleanup then limit enforcement, opt-in via `MAINTENANCE_INTERVAL`

mod maintenance;

pub use maintenance::{run_maintenance, spawn_maintenance_task, MaintenanceReport};
