//! Periodic background sweep for expired entries and idle rate-limit keys.

use crate::service::RelayService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Spawn the background sweep task.
///
/// Every `every`, the task prunes expired entries from both engines through
/// [`RelayService::sweep`], independent of request traffic. The sweep takes
/// the same engine locks as the request paths, so it interleaves safely with
/// concurrent handlers. The task runs until aborted; process shutdown is the
/// only cancellation there is.
pub fn spawn_sweeper(service: Arc<RelayService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first real
        // sweep happens one full period after startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = service.sweep();
            debug!(
                expired_commands = report.queue.expired_commands,
                expired_statuses = report.queue.expired_statuses,
                idle_rate_keys = report.idle_rate_keys,
                "sweep pass complete"
            );
        }
    })
}
