//! Background reaping task: periodically calls `scaleDown`.
//!
//! Mirrors the gateway's own `start_background_tasks` (`tokio::spawn` +
//! `tokio::time::interval`), generalized from its fixed-purpose cleanup
//! loops to this crate's single reap sweep.

use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Spawn the detached reaping loop. The returned handle is not normally
/// awaited; dropping it does not stop the task (only the process exiting
/// does), matching the gateway's fire-and-forget background tasks.
pub fn start_reaper(orchestrator: Arc<Orchestrator>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match orchestrator.scale_down().await {
                Ok(reaped) if !reaped.is_empty() => {
                    info!(count = reaped.len(), "reaped idle instances");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "reap sweep failed"),
            }
        }
    })
}
