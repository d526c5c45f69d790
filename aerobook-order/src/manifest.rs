use aerobook_core::{
    Actor, BookingStatus, BookingStore, CabinClass, CoreError, CoreResult, Flight,
    PassengerDetails,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestSort {
    #[default]
    Seat,
    Name,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ManifestSort,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub ticket_id: Uuid,
    pub booking_id: Uuid,
    pub seat_number: String,
    pub cabin_class: CabinClass,
    pub booking_status: BookingStatus,
    #[serde(flatten)]
    pub passenger: PassengerDetails,
}

impl ManifestEntry {
    fn matches(&self, needle: &str) -> bool {
        self.passenger.passenger_name.to_lowercase().contains(needle)
            || self.passenger.passport.expose().to_lowercase().contains(needle)
            || self.booking_id.to_string().contains(needle)
            || self.cabin_class.as_str().to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub flight: Flight,
    pub capacity: u32,
    pub occupied: u32,
    pub entries: Vec<ManifestEntry>,
}

/// Seat order puts "9A" before "10A".
fn seat_key(seat: &str) -> (usize, &str) {
    (seat.len(), seat)
}

#[derive(Clone)]
pub struct ManifestService {
    store: Arc<dyn BookingStore>,
}

impl ManifestService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn flight_manifest(
        &self,
        actor: &Actor,
        flight_number: &str,
        query: &ManifestQuery,
    ) -> CoreResult<Manifest> {
        actor.require_staff("view flight manifests")?;

        let flight = self
            .store
            .get_flight(flight_number)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("flight {}", flight_number)))?;
        let aircraft = self.store.get_aircraft(flight.aircraft_id).await?.ok_or_else(|| {
            CoreError::IntegrityError(format!("aircraft {} is missing", flight.aircraft_id))
        })?;

        let rows = self.store.flight_manifest(flight_number).await?;
        let occupied = rows.len() as u32;

        let mut entries: Vec<ManifestEntry> = rows
            .into_iter()
            .map(|row| ManifestEntry {
                ticket_id: row.ticket.id,
                booking_id: row.booking.id,
                seat_number: row.ticket.seat_number,
                cabin_class: row.booking.cabin_class,
                booking_status: row.booking.status,
                passenger: row.ticket.passenger,
            })
            .collect();

        if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            entries.retain(|e| e.matches(&needle));
        }

        match query.sort {
            ManifestSort::Seat => entries.sort_by(|a, b| seat_key(&a.seat_number).cmp(&seat_key(&b.seat_number))),
            ManifestSort::Name => entries.sort_by(|a, b| {
                a.passenger
                    .passenger_name
                    .to_lowercase()
                    .cmp(&b.passenger.passenger_name.to_lowercase())
                    .then_with(|| seat_key(&a.seat_number).cmp(&seat_key(&b.seat_number)))
            }),
        }

        tracing::debug!("Manifest for {}: {} of {} seats occupied", flight_number, occupied, aircraft.total_capacity());
        Ok(Manifest {
            flight,
            capacity: aircraft.total_capacity(),
            occupied,
            entries,
        })
    }
}
