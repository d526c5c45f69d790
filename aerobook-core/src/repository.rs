use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::booking::{Booking, Ticket};
use crate::flight::{Aircraft, Airport, CabinClass, Flight, FlightStatus, NewAircraft};
use crate::payment::Payment;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    /// A storage constraint rejected the write (seat taken, payment exists,
    /// restricted delete).
    #[error("{0}")]
    Conflict(String),
    /// Stored data cannot be mapped back into a valid domain value.
    #[error("{0}")]
    Integrity(String),
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Live ticket counts per cabin for one flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CabinOccupancy {
    pub economy: u32,
    pub business: u32,
    pub first: u32,
}

impl CabinOccupancy {
    pub fn get(&self, cabin: CabinClass) -> u32 {
        match cabin {
            CabinClass::Economy => self.economy,
            CabinClass::Business => self.business,
            CabinClass::First => self.first,
        }
    }

    pub fn add(&mut self, cabin: CabinClass, count: u32) {
        match cabin {
            CabinClass::Economy => self.economy += count,
            CabinClass::Business => self.business += count,
            CabinClass::First => self.first += count,
        }
    }

    pub fn total(&self) -> u32 {
        self.economy + self.business + self.first
    }
}

/// Result of deleting one ticket inside the store transaction.
#[derive(Debug, Clone)]
pub enum RemovalOutcome {
    /// Ticket deleted; `booking` is the state after the cascade rule ran.
    Removed { ticket: Ticket, booking: Booking },
    /// The owning booking was already cancelled, nothing changed.
    BookingAlreadyCancelled(Booking),
}

/// Result of a payment attempt, decided on the locked booking row.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    Confirmed { booking: Booking, payment: Payment },
    AlreadyConfirmed(Booking),
    Rejected(Booking),
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketWithBooking {
    pub ticket: Ticket,
    pub booking: Booking,
}

/// Persistence contract for the booking engine.
///
/// Every mutating method is atomic. Implementations enforce as storage
/// constraints: one live seat number per flight, one payment per booking,
/// and restrict-on-delete for airports, aircraft and flights that are still
/// referenced.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_airport(&self, airport: &Airport) -> StoreResult<()>;

    async fn get_airport(&self, code: &str) -> StoreResult<Option<Airport>>;

    /// Conflict while any flight departs from or arrives at it.
    async fn delete_airport(&self, code: &str) -> StoreResult<()>;

    async fn create_aircraft(&self, aircraft: &NewAircraft) -> StoreResult<Aircraft>;

    async fn get_aircraft(&self, id: i64) -> StoreResult<Option<Aircraft>>;

    /// Conflict while any flight uses it.
    async fn delete_aircraft(&self, id: i64) -> StoreResult<()>;

    /// Conflict on a duplicate flight number; NotFound when the aircraft or
    /// an airport does not exist.
    async fn create_flight(&self, flight: &Flight) -> StoreResult<()>;

    async fn get_flight(&self, flight_number: &str) -> StoreResult<Option<Flight>>;

    async fn list_flights(&self) -> StoreResult<Vec<Flight>>;

    async fn update_flight_status(&self, flight_number: &str, status: FlightStatus) -> StoreResult<()>;

    /// Conflict while the flight has live or paid bookings. Cancelled,
    /// unpaid bookings are removed together with the flight.
    async fn delete_flight(&self, flight_number: &str) -> StoreResult<()>;

    async fn live_occupancy(&self, flight_number: &str) -> StoreResult<CabinOccupancy>;

    /// Live occupancy of every flight that has at least one live ticket.
    async fn occupancy_by_flight(&self) -> StoreResult<HashMap<String, CabinOccupancy>>;

    async fn taken_seat_numbers(&self, flight_number: &str) -> StoreResult<BTreeSet<String>>;

    /// Writes the booking and all its tickets, or nothing. Conflict when any
    /// seat number is held by a live ticket on the same flight.
    async fn insert_booking(&self, booking: &Booking, tickets: &[Ticket]) -> StoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Tickets owned by the booking, ordered by seat number.
    async fn get_booking_tickets(&self, booking_id: Uuid) -> StoreResult<Vec<Ticket>>;

    async fn get_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>>;

    async fn get_payment(&self, booking_id: Uuid) -> StoreResult<Option<Payment>>;

    /// Newest first.
    async fn list_bookings_for_passenger(&self, passenger_id: &str) -> StoreResult<Vec<Booking>>;

    /// Deletes the ticket and applies `Booking::release_one_ticket` to its
    /// booking, re-checking under lock that the booking is not cancelled.
    async fn remove_ticket(&self, ticket_id: Uuid) -> StoreResult<RemovalOutcome>;

    /// Decides `Booking::payment_transition` on the locked booking row and
    /// writes `payment` only for the `Confirm` transition.
    async fn confirm_payment(&self, booking_id: Uuid, payment: &Payment) -> StoreResult<PaymentOutcome>;

    /// Cancels every booking still Pending with `created_at < cutoff`,
    /// releasing its tickets. The status predicate is evaluated at write
    /// time. Returns the cancelled ids.
    async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Uuid>>;

    /// Live tickets of the flight with their bookings.
    async fn flight_manifest(&self, flight_number: &str) -> StoreResult<Vec<TicketWithBooking>>;
}
