use aerobook_catalog::PricingEngine;
use aerobook_core::events::{publish_event, EventPublisher};
use aerobook_core::{
    Actor, Booking, BookingStore, CabinClass, CoreError, CoreResult, FieldError, Flight,
    PassengerDetails, Payment, Ticket,
};
use aerobook_shared::models::events::{BookingCreatedEvent, TOPIC_BOOKING_CREATED};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Seats and passengers are matched by position.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBookingRequest {
    pub flight_number: String,
    pub cabin_class: CabinClass,
    pub seat_numbers: Vec<String>,
    pub passengers: Vec<PassengerDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub tickets: Vec<Ticket>,
    /// Cabin price times seat count at creation time. Not stored.
    pub total_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub flight: Flight,
    pub tickets: Vec<Ticket>,
    pub payment: Option<Payment>,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub booking: Booking,
    pub flight: Flight,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MyBookings {
    pub upcoming: Vec<BookingSummary>,
    pub past: Vec<BookingSummary>,
}

/// Longest seat label the tickets table holds, e.g. "112AB".
const MAX_SEAT_NUMBER_LEN: usize = 5;

fn normalize_seat(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Creates bookings and serves the passenger's view of them.
#[derive(Clone)]
pub struct BookingLedger {
    store: Arc<dyn BookingStore>,
    events: Arc<dyn EventPublisher>,
}

impl BookingLedger {
    pub fn new(store: Arc<dyn BookingStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self { store, events }
    }

    async fn flight(&self, flight_number: &str) -> CoreResult<Flight> {
        self.store
            .get_flight(flight_number)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_number)))
    }

    /// Writes one Pending booking plus a ticket per seat, or nothing at all.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: NewBookingRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingReceipt> {
        let flight = self.flight(&request.flight_number).await?;
        let seats: Vec<String> = request.seat_numbers.iter().map(|s| normalize_seat(s)).collect();

        let mut errors = Vec::new();
        if seats.is_empty() {
            errors.push(FieldError::new("seat_numbers", "select at least one seat"));
        }
        if seats.iter().any(|s| s.is_empty()) {
            errors.push(FieldError::new("seat_numbers", "seat numbers must not be blank"));
        }
        if seats.iter().any(|s| {
            s.len() > MAX_SEAT_NUMBER_LEN || !s.chars().all(|c| c.is_ascii_alphanumeric())
        }) {
            errors.push(FieldError::new(
                "seat_numbers",
                format!(
                    "seat numbers must be at most {} letters or digits",
                    MAX_SEAT_NUMBER_LEN
                ),
            ));
        }
        let distinct: BTreeSet<&String> = seats.iter().collect();
        if distinct.len() != seats.len() {
            errors.push(FieldError::new("seat_numbers", "seat numbers must be distinct"));
        }
        if request.passengers.len() != seats.len() {
            errors.push(FieldError::new(
                "passengers",
                format!(
                    "expected {} passenger records, got {}",
                    seats.len(),
                    request.passengers.len()
                ),
            ));
        }
        if !errors.is_empty() {
            return Err(CoreError::ValidationError(errors));
        }

        let today = now.date_naive();
        let errors: Vec<FieldError> = seats
            .iter()
            .zip(&request.passengers)
            .flat_map(|(seat, passenger)| passenger.validate(seat, today))
            .collect();
        if !errors.is_empty() {
            return Err(CoreError::ValidationError(errors));
        }

        let taken = self.store.taken_seat_numbers(&flight.flight_number).await?;
        let clashes: Vec<&str> = seats
            .iter()
            .filter(|s| taken.contains(*s))
            .map(String::as_str)
            .collect();
        if !clashes.is_empty() {
            return Err(CoreError::ConflictError(format!(
                "seats already taken on flight {}: {}",
                flight.flight_number,
                clashes.join(", ")
            )));
        }

        let booking = Booking::new_pending(
            flight.flight_number.clone(),
            Some(actor.subject.clone()),
            request.cabin_class,
            seats.len() as u32,
            now,
        );
        let tickets: Vec<Ticket> = seats
            .iter()
            .zip(request.passengers)
            .map(|(seat, passenger)| Ticket::new(&booking, seat.clone(), passenger))
            .collect();

        let total_price = PricingEngine::quote(&flight, booking.cabin_class, booking.number_of_passengers).total;

        // A concurrent booking of the same seat loses here with Conflict.
        self.store.insert_booking(&booking, &tickets).await?;

        info!(
            "Booking {} created on {} ({} x {}) for {}",
            booking.id, booking.flight_number, booking.number_of_passengers, booking.cabin_class, actor.subject
        );

        let event = BookingCreatedEvent {
            booking_id: booking.id,
            flight_number: booking.flight_number.clone(),
            cabin_class: booking.cabin_class.to_string(),
            seat_numbers: seats,
            timestamp: now.timestamp(),
        };
        publish_event(self.events.as_ref(), TOPIC_BOOKING_CREATED, &booking.id.to_string(), &event).await;

        Ok(BookingReceipt {
            booking,
            tickets,
            total_price,
        })
    }

    /// Owner or staff only; anyone else gets NotFound.
    pub async fn booking_details(&self, booking_id: Uuid, actor: &Actor) -> CoreResult<BookingDetails> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .filter(|b| b.is_owned_by(actor) || actor.has_staff_access())
            .ok_or_else(|| CoreError::NotFound(format!("booking {}", booking_id)))?;

        let flight = self.flight(&booking.flight_number).await?;
        let tickets = self.store.get_booking_tickets(booking.id).await?;
        let payment = self.store.get_payment(booking.id).await?;
        let amount = PricingEngine::payment_amount(&flight, &booking);

        Ok(BookingDetails {
            booking,
            flight,
            tickets,
            payment,
            amount,
        })
    }

    /// The actor's bookings newest first, split on departure time.
    pub async fn my_bookings(&self, actor: &Actor, now: DateTime<Utc>) -> CoreResult<MyBookings> {
        let bookings = self.store.list_bookings_for_passenger(&actor.subject).await?;
        let mut flights: HashMap<String, Flight> = HashMap::new();
        let mut result = MyBookings::default();

        for booking in bookings {
            let flight = match flights.get(&booking.flight_number) {
                Some(f) => f.clone(),
                None => match self.store.get_flight(&booking.flight_number).await? {
                    Some(f) => {
                        flights.insert(f.flight_number.clone(), f.clone());
                        f
                    }
                    None => {
                        warn!("Booking {} references missing flight {}", booking.id, booking.flight_number);
                        continue;
                    }
                },
            };

            let summary = BookingSummary { booking, flight };
            if summary.flight.departure_time >= now {
                result.upcoming.push(summary);
            } else {
                result.past.push(summary);
            }
        }

        Ok(result)
    }
}
