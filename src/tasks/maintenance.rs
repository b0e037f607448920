//! Maintenance Task
//!
//! Optional background task that periodically sweeps expired entries and
//! trims the cache to its limit. The cache itself never schedules anything;
//! this task is just another caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{KeyValueStore, TtlCache};

/// Result of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Expired or corrupt entries removed by cleanup
    pub expired: usize,
    /// Entries evicted by limit enforcement
    pub evicted: usize,
}

/// Runs cleanup then limit enforcement once.
///
/// Cleanup goes first so expired entries don't take eviction slots from
/// live ones.
pub fn run_maintenance<S: KeyValueStore>(cache: &mut TtlCache<S>) -> MaintenanceReport {
    let expired = cache.cleanup();
    let evicted = cache.enforce_limit();
    MaintenanceReport { expired, evicted }
}

/// Spawns a background task that runs [`run_maintenance`] every interval.
///
/// Each pass runs on the blocking pool, since a file-backed store writes to
/// disk.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval_secs` - Seconds between passes, must be non-zero
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_maintenance_task<S>(cache: Arc<RwLock<TtlCache<S>>>, interval_secs: u64) -> JoinHandle<()>
where
    S: KeyValueStore + 'static,
{
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let shared = Arc::clone(&cache);
            let pass =
                tokio::task::spawn_blocking(move || run_maintenance(&mut shared.blocking_write()));
            let report = match pass.await {
                Ok(report) => report,
                Err(e) => {
                    warn!("Cache maintenance pass failed: {}", e);
                    continue;
                }
            };

            if report != MaintenanceReport::default() {
                info!(
                    "Cache maintenance: removed {} expired, evicted {} over limit",
                    report.expired, report.evicted
                );
            } else {
                debug!("Cache maintenance: nothing to remove");
            }
        }
    })
}
