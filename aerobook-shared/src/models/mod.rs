pub mod events;

pub use events::{
    BookingConfirmedEvent, BookingCreatedEvent, BookingsExpiredEvent, TicketReleasedEvent,
};
