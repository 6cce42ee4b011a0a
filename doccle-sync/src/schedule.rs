//! Periodic trigger for [`SyncRunner::run_once`].

use doccle_sync_core::runner::SyncRunner;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Runs a sync immediately and then once every `every`, forever.
///
/// A failed run is logged and the loop keeps going. Ticks missed while a run
/// was still busy are dropped, not replayed.
pub async fn run_schedule(runner: Arc<SyncRunner>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_secs = every.as_secs_f64(), "[SCHEDULE] Polling started");

    loop {
        ticker.tick().await;
        if let Err(e) = runner.run_once().await {
            error!(error = %e, "[SCHEDULE] Sync run failed");
        }
        info!(
            next_in_secs = every.as_secs_f64(),
            "[SCHEDULE] Waiting for next run"
        );
    }
}
