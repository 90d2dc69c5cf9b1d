use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};
use crate::state::AppState;

/// Drives the reconciliation passes on a fixed period.
///
/// Each tick runs in its own task, so a slow pass never delays the next tick
/// and overlapping ticks are possible. Tick failures and panics are logged
/// and never stop the loop.
pub async fn start_scheduler(state: Arc<AppState>) {
    let settings = state.reconciler.settings().clone();
    if !settings.enabled {
        info!("Reconciliation scheduler disabled by configuration");
        return;
    }

    info!(interval_secs = settings.interval_secs, "Starting reconciliation scheduler...");

    let mut ticker = interval(Duration::from_secs(settings.interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        ticker.tick().await;
        tick += 1;

        let reconciler = state.reconciler.clone();
        let span = info_span!("reconciliation_tick", tick);
        let run = tokio::spawn(
            async move { reconciler.run_tick(Utc::now()).await }.instrument(span)
        );

        tokio::spawn(async move {
            match run.await {
                Ok(report) if !report.errors.is_empty() => {
                    warn!(tick, errors = ?report.errors, "Reconciliation tick finished with errors");
                }
                Ok(report) => {
                    debug!(
                        tick,
                        closed = report.closed,
                        auto_approved = report.auto_approval.approved,
                        resent = report.resent.notified,
                        "Reconciliation tick finished"
                    );
                }
                Err(e) => error!(tick, "Reconciliation tick aborted: {:?}", e),
            }
        });
    }
}

pub fn spawn_scheduler(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(start_scheduler(state))
}
