pub mod inventory;
pub mod pricing;
pub mod schedule;
pub mod seat_map;

pub use inventory::{CabinAvailability, InventoryService, SeatAvailability};
pub use pricing::{PriceQuote, PricingEngine};
pub use schedule::{FlightOffer, FlightSearchResults, ScheduleService};
pub use seat_map::SeatMap;
