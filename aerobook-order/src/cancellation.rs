use aerobook_core::events::{publish_event, EventPublisher};
use aerobook_core::repository::RemovalOutcome;
use aerobook_core::{Actor, Booking, BookingStore, CoreError, CoreResult, Ticket};
use aerobook_shared::models::events::{TicketReleasedEvent, TOPIC_TICKET_RELEASED};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationOutcome {
    /// The ticket was deleted. `booking` is its state afterwards.
    Released {
        ticket_id: Uuid,
        seat_number: String,
        booking: Booking,
        booking_cancelled: bool,
    },
    /// The booking was already cancelled; nothing changed.
    AlreadyCancelled { booking: Booking },
}

/// Removes single tickets, cancelling the booking with its last ticket.
#[derive(Clone)]
pub struct TicketCancellation {
    store: Arc<dyn BookingStore>,
    events: Arc<dyn EventPublisher>,
}

impl TicketCancellation {
    pub fn new(store: Arc<dyn BookingStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    async fn ticket_and_booking(&self, ticket_id: Uuid) -> CoreResult<(Ticket, Booking)> {
        let ticket = self
            .store
            .get_ticket(ticket_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("ticket {}", ticket_id)))?;
        let booking = self.store.get_booking(ticket.booking_id).await?.ok_or_else(|| {
            CoreError::IntegrityError(format!("ticket {} has no booking", ticket_id))
        })?;
        Ok((ticket, booking))
    }

    /// Passenger self-service: only the booking owner, only before departure.
    pub async fn cancel_ticket(
        &self,
        ticket_id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> CoreResult<CancellationOutcome> {
        let (ticket, booking) = match self.ticket_and_booking(ticket_id).await {
            Ok((ticket, booking)) if booking.is_owned_by(actor) => (ticket, booking),
            Ok(_) | Err(CoreError::NotFound(_)) => {
                return Err(CoreError::NotFound(format!("ticket {}", ticket_id)))
            }
            Err(e) => return Err(e),
        };

        if booking.is_cancelled() {
            warn!("Ticket {} belongs to cancelled booking {}", ticket_id, booking.id);
            return Ok(CancellationOutcome::AlreadyCancelled { booking });
        }

        let flight = self
            .store
            .get_flight(&ticket.flight_number)
            .await?
            .ok_or_else(|| CoreError::IntegrityError(format!("flight {} is missing", ticket.flight_number)))?;
        if flight.has_departed(now) {
            return Err(CoreError::StateError(format!(
                "flight {} has already departed; tickets can no longer be cancelled",
                flight.flight_number
            )));
        }

        self.release(ticket_id, actor, false, now).await
    }

    /// Staff removal of a passenger. No departure restriction.
    pub async fn remove_passenger(&self, ticket_id: Uuid, actor: &Actor) -> CoreResult<CancellationOutcome> {
        actor.require_staff("remove passengers")?;
        self.release(ticket_id, actor, true, Utc::now()).await
    }

    async fn release(
        &self,
        ticket_id: Uuid,
        actor: &Actor,
        by_staff: bool,
        now: DateTime<Utc>,
    ) -> CoreResult<CancellationOutcome> {
        // The store re-checks the booking status under lock; a concurrent
        // sweep shows up here as BookingAlreadyCancelled.
        match self.store.remove_ticket(ticket_id).await? {
            RemovalOutcome::BookingAlreadyCancelled(booking) => {
                warn!("Ticket {} belongs to cancelled booking {}", ticket_id, booking.id);
                Ok(CancellationOutcome::AlreadyCancelled { booking })
            }
            RemovalOutcome::Removed { ticket, booking } => {
                let booking_cancelled = booking.is_cancelled();
                info!(
                    "Ticket {} (seat {}) released from booking {} by {}{}",
                    ticket.id,
                    ticket.seat_number,
                    booking.id,
                    actor.subject,
                    if booking_cancelled { "; booking cancelled" } else { "" }
                );

                let event = TicketReleasedEvent {
                    ticket_id: ticket.id,
                    booking_id: booking.id,
                    flight_number: ticket.flight_number.clone(),
                    seat_number: ticket.seat_number.clone(),
                    booking_cancelled,
                    by_staff,
                    timestamp: now.timestamp(),
                };
                publish_event(self.events.as_ref(), TOPIC_TICKET_RELEASED, &booking.id.to_string(), &event).await;

                Ok(CancellationOutcome::Released {
                    ticket_id: ticket.id,
                    seat_number: ticket.seat_number,
                    booking,
                    booking_cancelled,
                })
            }
        }
    }
}
