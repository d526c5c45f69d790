use uuid::Uuid;

pub const TOPIC_BOOKING_CREATED: &str = "booking.created";
pub const TOPIC_BOOKING_CONFIRMED: &str = "booking.confirmed";
pub const TOPIC_TICKET_RELEASED: &str = "ticket.released";
pub const TOPIC_BOOKINGS_EXPIRED: &str = "bookings.expired";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub flight_number: String,
    pub cabin_class: String,
    pub seat_numbers: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub flight_number: String,
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TicketReleasedEvent {
    pub ticket_id: Uuid,
    pub booking_id: Uuid,
    pub flight_number: String,
    pub seat_number: String,
    /// True when the release cancelled the whole booking.
    pub booking_cancelled: bool,
    pub by_staff: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingsExpiredEvent {
    pub booking_ids: Vec<Uuid>,
    pub cutoff: i64,
    pub timestamp: i64,
}
