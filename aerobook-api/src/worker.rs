use aerobook_order::ExpirySweeper;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};

/// Runs the expiry sweep forever on a fixed interval. Failures are logged by
/// the sweeper and the next tick tries again.
pub async fn start_expiry_worker(sweeper: ExpirySweeper, every: Duration) {
    info!(
        "Expiry worker started: every {:?}, grace {}s",
        every,
        sweeper.grace().num_seconds()
    );

    // `interval` panics on a zero period.
    let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let cancelled = sweeper.sweep(Utc::now()).await;
        if cancelled > 0 {
            info!("Expiry sweep cancelled {} stale bookings", cancelled);
        } else {
            debug!("Expiry sweep found nothing to cancel");
        }
    }
}
