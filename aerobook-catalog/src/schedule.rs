use aerobook_core::search::FlightSearchCriteria;
use aerobook_core::{
    Actor, Aircraft, Airport, BookingStore, CabinClass, CoreError, CoreResult, FieldError, Flight,
    FlightStatus, NewAircraft,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::inventory::InventoryService;

/// One search hit, priced for the requested cabin.
#[derive(Debug, Clone, Serialize)]
pub struct FlightOffer {
    #[serde(flatten)]
    pub flight: Flight,
    pub cabin_class: CabinClass,
    pub price: i64,
    pub available_seats: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightSearchResults {
    pub departure_city: Option<String>,
    pub destination_city: Option<String>,
    pub flights: Vec<FlightOffer>,
}

/// Staff-maintained schedule data and the passenger-facing search over it.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn BookingStore>,
    inventory: InventoryService,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            store,
        }
    }

    pub async fn create_airport(&self, actor: &Actor, airport: Airport) -> CoreResult<Airport> {
        actor.require_staff("create airports")?;
        airport.validate()?;
        self.store.create_airport(&airport).await?;
        info!("Airport {} created by {}", airport.code, actor.subject);
        Ok(airport)
    }

    pub async fn delete_airport(&self, actor: &Actor, code: &str) -> CoreResult<()> {
        actor.require_staff("delete airports")?;
        self.store.delete_airport(code).await?;
        info!("Airport {} deleted by {}", code, actor.subject);
        Ok(())
    }

    pub async fn create_aircraft(&self, actor: &Actor, aircraft: NewAircraft) -> CoreResult<Aircraft> {
        actor.require_staff("create aircraft")?;
        if aircraft.model.trim().is_empty() {
            return Err(CoreError::invalid("model", "model is required"));
        }
        let created = self.store.create_aircraft(&aircraft).await?;
        info!("Aircraft {} ({}) created by {}", created.id, created.model, actor.subject);
        Ok(created)
    }

    pub async fn delete_aircraft(&self, actor: &Actor, id: i64) -> CoreResult<()> {
        actor.require_staff("delete aircraft")?;
        self.store.delete_aircraft(id).await?;
        Ok(())
    }

    pub async fn create_flight(&self, actor: &Actor, flight: Flight) -> CoreResult<Flight> {
        actor.require_staff("create flights")?;
        flight.validate()?;
        self.store.create_flight(&flight).await?;
        info!(
            "Flight {} {}->{} created by {}",
            flight.flight_number, flight.departure_airport, flight.arrival_airport, actor.subject
        );
        Ok(flight)
    }

    pub async fn update_flight_status(
        &self,
        actor: &Actor,
        flight_number: &str,
        status: FlightStatus,
    ) -> CoreResult<Flight> {
        actor.require_staff("update flight status")?;
        self.store.update_flight_status(flight_number, status).await?;
        info!("Flight {} status set to {} by {}", flight_number, status, actor.subject);
        self.get_flight(flight_number).await
    }

    /// Refused while the flight still has live or paid bookings.
    pub async fn delete_flight(&self, actor: &Actor, flight_number: &str) -> CoreResult<()> {
        actor.require_staff("delete flights")?;
        self.store.delete_flight(flight_number).await?;
        info!("Flight {} deleted by {}", flight_number, actor.subject);
        Ok(())
    }

    pub async fn get_flight(&self, flight_number: &str) -> CoreResult<Flight> {
        self.store
            .get_flight(flight_number)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_number)))
    }

    pub async fn search(&self, criteria: &FlightSearchCriteria) -> CoreResult<FlightSearchResults> {
        let mut errors = Vec::new();
        if criteria.date_from > criteria.date_to {
            errors.push(FieldError::new("date_to", "date_to must not be before date_from"));
        }
        if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
            if min > max {
                errors.push(FieldError::new("max_price", "max_price must not be below min_price"));
            }
        }
        if !errors.is_empty() {
            return Err(CoreError::ValidationError(errors));
        }

        let origin = criteria.origin.trim().to_ascii_uppercase();
        let destination = criteria.destination.trim().to_ascii_uppercase();
        let cabin = criteria.cabin_class;

        let mut flights = Vec::new();
        for flight in self.store.list_flights().await? {
            if flight.departure_airport != origin || flight.arrival_airport != destination {
                continue;
            }
            let date = flight.departure_time.date_naive();
            if date < criteria.date_from || date > criteria.date_to {
                continue;
            }
            let price = flight.cabin_price(cabin);
            if criteria.min_price.is_some_and(|min| price < min)
                || criteria.max_price.is_some_and(|max| price > max)
            {
                continue;
            }

            let availability = self.inventory.available_seats(&flight.flight_number).await?;
            let Some(seats) = availability.cabin(cabin) else {
                continue;
            };
            if seats.capacity == 0 {
                continue;
            }
            let available_seats = seats.available;
            flights.push(FlightOffer {
                flight,
                cabin_class: cabin,
                price,
                available_seats,
            });
        }

        let departure_city = self.store.get_airport(&origin).await?.map(|a| a.city);
        let destination_city = self.store.get_airport(&destination).await?.map(|a| a.city);

        tracing::debug!("Search {}->{} {:?}: {} flights", origin, destination, cabin, flights.len());
        Ok(FlightSearchResults {
            departure_city,
            destination_city,
            flights,
        })
    }
}
