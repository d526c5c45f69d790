use aerobook_core::events::{publish_event, EventPublisher};
use aerobook_core::{BookingStore, CoreResult};
use aerobook_shared::models::events::{BookingsExpiredEvent, TOPIC_BOOKINGS_EXPIRED};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_PENDING_GRACE_SECONDS: i64 = 300;

pub fn default_pending_grace() -> Duration {
    Duration::seconds(DEFAULT_PENDING_GRACE_SECONDS)
}

/// Cancels bookings left Pending past the grace period, freeing their seats.
#[derive(Clone)]
pub struct ExpirySweeper {
    store: Arc<dyn BookingStore>,
    events: Arc<dyn EventPublisher>,
    grace: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn BookingStore>, events: Arc<dyn EventPublisher>, grace: Duration) -> Self {
        Self { store, events, grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Returns the ids cancelled by this run.
    pub async fn try_sweep(&self, now: DateTime<Utc>) -> CoreResult<Vec<Uuid>> {
        let cutoff = now - self.grace;
        let cancelled = self.store.cancel_stale_pending(cutoff).await?;

        if cancelled.is_empty() {
            info!("Expiry sweep: no stale pending bookings");
            return Ok(cancelled);
        }

        info!("Expiry sweep: cancelled {} stale pending bookings", cancelled.len());
        let event = BookingsExpiredEvent {
            booking_ids: cancelled.clone(),
            cutoff: cutoff.timestamp(),
            timestamp: now.timestamp(),
        };
        publish_event(self.events.as_ref(), TOPIC_BOOKINGS_EXPIRED, "sweep", &event).await;
        Ok(cancelled)
    }

    /// Never fails: errors are logged and the next tick retries.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        match self.try_sweep(now).await {
            Ok(cancelled) => cancelled.len(),
            Err(e) => {
                error!("Expiry sweep failed: {}", e);
                0
            }
        }
    }
}
