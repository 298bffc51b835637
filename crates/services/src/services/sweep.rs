use chrono::Utc;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info};

use super::auction::AuctionService;

/// Runs `sweep_extensions_and_closes` every `sweep_interval` until the handle is
/// aborted. Failures are logged and the next tick tries again.
pub fn spawn_sweep_worker(service: AuctionService) -> JoinHandle<()> {
    let period = service.config().sweep_interval;
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match service.sweep_extensions_and_closes(Utc::now()).await {
                Ok(report) if report.is_idle() => {
                    debug!(examined = report.examined, "auction sweep idle");
                }
                Ok(report) => info!(
                    examined = report.examined,
                    extended = report.extended.len(),
                    closed = report.closed.len(),
                    skipped = report.skipped,
                    failed = report.failed.len(),
                    "auction sweep finished"
                ),
                Err(err) => error!(error = %err, "auction sweep failed"),
            }
        }
    })
}
