use aerobook_core::events::RecordingPublisher;
use aerobook_core::{
    Actor, Airport, BookingStore, CabinClass, Flight, FlightStatus, NewAircraft, PassengerDetails,
};
use aerobook_store::InMemoryBookingStore;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use crate::cancellation::TicketCancellation;
use crate::expiry::{default_pending_grace, ExpirySweeper};
use crate::finalizer::PaymentFinalizer;
use crate::ledger::{BookingLedger, NewBookingRequest};
use crate::manifest::ManifestService;
use crate::reports::ReportService;

pub const FLIGHT: &str = "EK202";

pub struct Fixture {
    pub store: Arc<InMemoryBookingStore>,
    pub events: Arc<RecordingPublisher>,
    pub passenger: Actor,
    pub now: DateTime<Utc>,
    aircraft_id: i64,
}

impl Fixture {
    pub fn ledger(&self) -> BookingLedger {
        BookingLedger::new(self.store.clone(), self.events.clone())
    }

    pub fn cancellation(&self) -> TicketCancellation {
        TicketCancellation::new(self.store.clone(), self.events.clone())
    }

    pub fn finalizer(&self) -> PaymentFinalizer {
        PaymentFinalizer::new(self.store.clone(), self.events.clone())
    }

    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(self.store.clone(), self.events.clone(), default_pending_grace())
    }

    pub fn manifest(&self) -> ManifestService {
        ManifestService::new(self.store.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.store.clone())
    }

    /// DXB to LHR on the fixture aircraft.
    pub async fn add_flight(&self, number: &str, departure: DateTime<Utc>) {
        self.store
            .create_flight(&Flight {
                flight_number: number.into(),
                departure_time: departure,
                arrival_time: departure + Duration::hours(7),
                economy_price: 100,
                business_price: 500,
                first_class_price: 1000,
                departure_airport: "DXB".into(),
                arrival_airport: "LHR".into(),
                aircraft_id: self.aircraft_id,
                status: FlightStatus::Scheduled,
            })
            .await
            .unwrap();
    }
}

/// Flight EK202 departing in three days on a 10/4/2 aircraft, priced
/// 100/500/1000.
pub async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryBookingStore::new());
    for (code, city) in [("DXB", "Dubai"), ("LHR", "London")] {
        store
            .create_airport(&Airport {
                code: code.into(),
                name: format!("{} International", city),
                city: city.into(),
                country: "XX".into(),
            })
            .await
            .unwrap();
    }
    let aircraft = store
        .create_aircraft(&NewAircraft {
            model: "A350".into(),
            economy_seats: 10,
            business_seats: 4,
            first_seats: 2,
        })
        .await
        .unwrap();

    let fx = Fixture {
        store,
        events: Arc::new(RecordingPublisher::new()),
        passenger: Actor::passenger("passenger-1"),
        now: Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
        aircraft_id: aircraft.id,
    };
    fx.add_flight(FLIGHT, fx.now + Duration::days(3)).await;
    fx
}

pub fn passenger(name: &str) -> PassengerDetails {
    PassengerDetails {
        passenger_name: name.into(),
        passport: "P12345678".into(),
        national_id: "1234567890".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
    }
}

pub fn request(cabin: CabinClass, seats: &[&str]) -> NewBookingRequest {
    NewBookingRequest {
        flight_number: FLIGHT.into(),
        cabin_class: cabin,
        seat_numbers: seats.iter().map(|s| s.to_string()).collect(),
        passengers: seats.iter().map(|_| passenger("Sam Carter")).collect(),
    }
}

pub fn request_with_names(cabin: CabinClass, seats: &[(&str, &str)]) -> NewBookingRequest {
    NewBookingRequest {
        flight_number: FLIGHT.into(),
        cabin_class: cabin,
        seat_numbers: seats.iter().map(|(s, _)| s.to_string()).collect(),
        passengers: seats.iter().map(|(_, n)| passenger(n)).collect(),
    }
}
