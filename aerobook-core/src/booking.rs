use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::actor::Actor;
use crate::flight::CabinClass;
use crate::passenger::PassengerDetails;
use crate::CoreError;

/// Booking status in the lifecycle. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::IntegrityError(format!(
                "unknown booking status: {}",
                other
            ))),
        }
    }
}

/// What a payment attempt does to a booking in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    /// Pending: record the payment and confirm.
    Confirm,
    /// Confirmed: succeed without touching anything.
    AlreadyConfirmed,
    /// Cancelled: refuse, nothing is written.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub flight_number: String,
    pub passenger_id: Option<String>,
    pub cabin_class: CabinClass,
    pub number_of_passengers: u32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new_pending(
        flight_number: impl Into<String>,
        passenger_id: Option<String>,
        cabin_class: CabinClass,
        number_of_passengers: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_number: flight_number.into(),
            passenger_id,
            cabin_class,
            number_of_passengers,
            status: BookingStatus::Pending,
            created_at: now,
        }
    }

    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        self.passenger_id.as_deref() == Some(actor.subject.as_str())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Pending and created strictly before `now - grace`.
    pub fn is_stale(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        self.status == BookingStatus::Pending && self.created_at < now - grace
    }

    pub fn payment_transition(&self) -> PaymentTransition {
        match self.status {
            BookingStatus::Pending => PaymentTransition::Confirm,
            BookingStatus::Confirmed => PaymentTransition::AlreadyConfirmed,
            BookingStatus::Cancelled => PaymentTransition::Reject,
        }
    }

    /// Applies the removal of one live ticket. Returns true when it was the
    /// last one and the booking is now cancelled.
    pub fn release_one_ticket(&mut self) -> bool {
        self.number_of_passengers = self.number_of_passengers.saturating_sub(1);
        if self.number_of_passengers == 0 {
            self.status = BookingStatus::Cancelled;
            true
        } else {
            false
        }
    }
}

/// A seat assignment for one passenger. `flight_number` mirrors the owning
/// booking so seat uniqueness can be enforced per flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub flight_number: String,
    pub seat_number: String,
    #[serde(flatten)]
    pub passenger: PassengerDetails,
}

impl Ticket {
    pub fn new(booking: &Booking, seat_number: impl Into<String>, passenger: PassengerDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            flight_number: booking.flight_number.clone(),
            seat_number: seat_number.into(),
            passenger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn booking(passengers: u32) -> Booking {
        let t = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        Booking::new_pending("EK101", Some("user-1".into()), CabinClass::Economy, passengers, t)
    }

    #[test]
    fn test_payment_transitions() {
        let mut b = booking(1);
        assert_eq!(b.payment_transition(), PaymentTransition::Confirm);
        b.status = BookingStatus::Confirmed;
        assert_eq!(b.payment_transition(), PaymentTransition::AlreadyConfirmed);
        b.status = BookingStatus::Cancelled;
        assert_eq!(b.payment_transition(), PaymentTransition::Reject);
    }

    #[test]
    fn test_last_ticket_cancels() {
        let mut b = booking(2);
        assert!(!b.release_one_ticket());
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.number_of_passengers, 1);

        assert!(b.release_one_ticket());
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_confirmed_booking_keeps_status_on_partial_release() {
        let mut b = booking(3);
        b.status = BookingStatus::Confirmed;
        b.release_one_ticket();
        assert_eq!(b.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_staleness_window() {
        let b = booking(1);
        let grace = Duration::minutes(5);
        assert!(!b.is_stale(b.created_at + Duration::minutes(5), grace));
        assert!(b.is_stale(b.created_at + Duration::minutes(6), grace));

        let mut confirmed = b.clone();
        confirmed.status = BookingStatus::Confirmed;
        assert!(!confirmed.is_stale(b.created_at + Duration::days(30), grace));
    }

    #[test]
    fn test_ownership() {
        let b = booking(1);
        assert!(b.is_owned_by(&Actor::passenger("user-1")));
        assert!(!b.is_owned_by(&Actor::passenger("hacker")));
    }

    #[test]
    fn test_status_round_trip_and_unknown() {
        assert_eq!("CONFIRMED".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!(matches!(
            "EXPIRED".parse::<BookingStatus>(),
            Err(CoreError::IntegrityError(_))
        ));
    }
}
