use aerobook_core::repository::CabinOccupancy;
use aerobook_core::{Aircraft, BookingStore, CabinClass, CoreError, CoreResult, Flight};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CabinAvailability {
    pub cabin_class: CabinClass,
    pub capacity: u32,
    pub sold: u32,
    pub available: u32,
}

/// Seat counts for one flight, derived from live tickets at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatAvailability {
    pub flight_number: String,
    pub capacity: u32,
    pub sold: u32,
    /// Never negative; see `overbooked`.
    pub available: u32,
    /// Live tickets beyond capacity. Non-zero only when stored data is
    /// already inconsistent.
    pub overbooked: u32,
    pub cabins: Vec<CabinAvailability>,
}

impl SeatAvailability {
    pub fn compute(flight_number: &str, aircraft: &Aircraft, sold: &CabinOccupancy) -> Self {
        let cabins = CabinClass::ALL
            .iter()
            .map(|cabin| {
                let capacity = aircraft.capacity(*cabin);
                let sold = sold.get(*cabin);
                CabinAvailability {
                    cabin_class: *cabin,
                    capacity,
                    sold,
                    available: capacity.saturating_sub(sold),
                }
            })
            .collect();

        let capacity = aircraft.total_capacity();
        let total_sold = sold.total();
        Self {
            flight_number: flight_number.to_string(),
            capacity,
            sold: total_sold,
            available: capacity.saturating_sub(total_sold),
            overbooked: total_sold.saturating_sub(capacity),
            cabins,
        }
    }

    pub fn cabin(&self, cabin: CabinClass) -> Option<&CabinAvailability> {
        self.cabins.iter().find(|c| c.cabin_class == cabin)
    }
}

/// Read side of seat inventory. Nothing is cached: every call goes to the
/// store.
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn BookingStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    async fn flight_and_aircraft(&self, flight_number: &str) -> CoreResult<(Flight, Aircraft)> {
        let flight = self
            .store
            .get_flight(flight_number)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_number)))?;
        let aircraft = self.store.get_aircraft(flight.aircraft_id).await?.ok_or_else(|| {
            CoreError::IntegrityError(format!(
                "flight {} references missing aircraft {}",
                flight_number, flight.aircraft_id
            ))
        })?;
        Ok((flight, aircraft))
    }

    pub async fn aircraft_for(&self, flight_number: &str) -> CoreResult<Aircraft> {
        Ok(self.flight_and_aircraft(flight_number).await?.1)
    }

    pub async fn available_seats(&self, flight_number: &str) -> CoreResult<SeatAvailability> {
        let (_, aircraft) = self.flight_and_aircraft(flight_number).await?;
        let sold = self.store.live_occupancy(flight_number).await?;
        let availability = SeatAvailability::compute(flight_number, &aircraft, &sold);

        if availability.overbooked > 0 {
            tracing::warn!(
                "Flight {} is overbooked by {} seats ({} sold, capacity {})",
                flight_number,
                availability.overbooked,
                availability.sold,
                availability.capacity
            );
        }
        Ok(availability)
    }

    /// Seat numbers held by live tickets, across all cabins.
    pub async fn taken_seat_numbers(&self, flight_number: &str) -> CoreResult<BTreeSet<String>> {
        if self.store.get_flight(flight_number).await?.is_none() {
            return Err(CoreError::NotFound(format!("flight {}", flight_number)));
        }
        Ok(self.store.taken_seat_numbers(flight_number).await?)
    }
}
