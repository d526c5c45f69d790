pub mod actor;
pub mod booking;
pub mod events;
pub mod flight;
pub mod passenger;
pub mod payment;
pub mod repository;
pub mod search;

pub use actor::Actor;
pub use booking::{Booking, BookingStatus, PaymentTransition, Ticket};
pub use flight::{Aircraft, Airport, CabinClass, Flight, FlightStatus, NewAircraft};
pub use passenger::PassengerDetails;
pub use payment::{Payment, PaymentMethod};
pub use repository::{BookingStore, StoreError, StoreResult};

use serde::Serialize;

/// One rejected input field. `seat` is set when the field belongs to the
/// passenger record of a specific seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat: Option<String>,
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            seat: None,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn for_seat(seat: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            seat: Some(seat.to_string()),
            field: field.into(),
            message: message.into(),
        }
    }
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| match &e.seat {
            Some(seat) => format!("seat {} {}: {}", seat, e.field, e.message),
            None => format!("{}: {}", e.field, e.message),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Unknown id, or an id the actor does not own. The two are reported
    /// identically so existence does not leak.
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation failed: {}", describe_fields(.0))]
    ValidationError(Vec<FieldError>),
    #[error("Conflict: {0}")]
    ConflictError(String),
    #[error("Invalid state: {0}")]
    StateError(String),
    #[error("Not authorized: {0}")]
    AuthorizationError(String),
    #[error("Data integrity violation: {0}")]
    IntegrityError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl CoreError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::ValidationError(vec![FieldError::new(field, message)])
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::NotFound(what),
            StoreError::Conflict(msg) => CoreError::ConflictError(msg),
            StoreError::Integrity(msg) => CoreError::IntegrityError(msg),
            StoreError::Backend(msg) => CoreError::StorageError(msg),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
