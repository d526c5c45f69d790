use aerobook_core::repository::{
    BookingStore, CabinOccupancy, PaymentOutcome, RemovalOutcome, StoreError, StoreResult,
    TicketWithBooking,
};
use aerobook_core::{
    Aircraft, Airport, Booking, BookingStatus, Flight, FlightStatus, NewAircraft, Payment,
    PaymentTransition, Ticket,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

struct StoredTicket {
    ticket: Ticket,
    released: bool,
}

#[derive(Default)]
struct Tables {
    airports: BTreeMap<String, Airport>,
    aircraft: BTreeMap<i64, Aircraft>,
    next_aircraft_id: i64,
    flights: BTreeMap<String, Flight>,
    bookings: HashMap<Uuid, Booking>,
    tickets: HashMap<Uuid, StoredTicket>,
    payments: HashMap<Uuid, Payment>,
}

impl Tables {
    fn live_tickets<'a>(&'a self, flight_number: &'a str) -> impl Iterator<Item = &'a Ticket> + 'a {
        self.tickets
            .values()
            .filter(move |t| !t.released && t.ticket.flight_number == flight_number)
            .map(|t| &t.ticket)
    }

    fn booking_of(&self, ticket: &Ticket) -> StoreResult<&Booking> {
        self.bookings.get(&ticket.booking_id).ok_or_else(|| {
            StoreError::Integrity(format!("ticket {} has no booking", ticket.id))
        })
    }

    fn release_tickets(&mut self, booking_id: Uuid) {
        for stored in self.tickets.values_mut() {
            if stored.ticket.booking_id == booking_id {
                stored.released = true;
            }
        }
    }
}

/// Single-process store. One mutex guards every table, so each operation is
/// serialisable. Backs the test suites and API runs without Postgres.
#[derive(Default)]
pub struct InMemoryBookingStore {
    tables: Mutex<Tables>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create_airport(&self, airport: &Airport) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        if db.airports.contains_key(&airport.code) {
            return Err(StoreError::Conflict(format!("airport {} already exists", airport.code)));
        }
        db.airports.insert(airport.code.clone(), airport.clone());
        Ok(())
    }

    async fn get_airport(&self, code: &str) -> StoreResult<Option<Airport>> {
        Ok(self.tables.lock().await.airports.get(code).cloned())
    }

    async fn delete_airport(&self, code: &str) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        if !db.airports.contains_key(code) {
            return Err(StoreError::NotFound(format!("airport {}", code)));
        }
        if db
            .flights
            .values()
            .any(|f| f.departure_airport == code || f.arrival_airport == code)
        {
            return Err(StoreError::Conflict(format!("airport {} is used by flights", code)));
        }
        db.airports.remove(code);
        Ok(())
    }

    async fn create_aircraft(&self, aircraft: &NewAircraft) -> StoreResult<Aircraft> {
        let mut db = self.tables.lock().await;
        db.next_aircraft_id += 1;
        let created = Aircraft::from_new(db.next_aircraft_id, aircraft);
        db.aircraft.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_aircraft(&self, id: i64) -> StoreResult<Option<Aircraft>> {
        Ok(self.tables.lock().await.aircraft.get(&id).cloned())
    }

    async fn delete_aircraft(&self, id: i64) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        if !db.aircraft.contains_key(&id) {
            return Err(StoreError::NotFound(format!("aircraft {}", id)));
        }
        if db.flights.values().any(|f| f.aircraft_id == id) {
            return Err(StoreError::Conflict(format!("aircraft {} is used by flights", id)));
        }
        db.aircraft.remove(&id);
        Ok(())
    }

    async fn create_flight(&self, flight: &Flight) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        if db.flights.contains_key(&flight.flight_number) {
            return Err(StoreError::Conflict(format!(
                "flight {} already exists",
                flight.flight_number
            )));
        }
        if !db.aircraft.contains_key(&flight.aircraft_id) {
            return Err(StoreError::NotFound(format!("aircraft {}", flight.aircraft_id)));
        }
        for code in [&flight.departure_airport, &flight.arrival_airport] {
            if !db.airports.contains_key(code) {
                return Err(StoreError::NotFound(format!("airport {}", code)));
            }
        }
        db.flights.insert(flight.flight_number.clone(), flight.clone());
        Ok(())
    }

    async fn get_flight(&self, flight_number: &str) -> StoreResult<Option<Flight>> {
        Ok(self.tables.lock().await.flights.get(flight_number).cloned())
    }

    async fn list_flights(&self) -> StoreResult<Vec<Flight>> {
        let db = self.tables.lock().await;
        let mut flights: Vec<Flight> = db.flights.values().cloned().collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn update_flight_status(&self, flight_number: &str, status: FlightStatus) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        let flight = db
            .flights
            .get_mut(flight_number)
            .ok_or_else(|| StoreError::NotFound(format!("flight {}", flight_number)))?;
        flight.status = status;
        Ok(())
    }

    async fn delete_flight(&self, flight_number: &str) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        if !db.flights.contains_key(flight_number) {
            return Err(StoreError::NotFound(format!("flight {}", flight_number)));
        }

        let bookings: Vec<&Booking> = db
            .bookings
            .values()
            .filter(|b| b.flight_number == flight_number)
            .collect();
        if bookings
            .iter()
            .any(|b| !b.is_cancelled() || db.payments.contains_key(&b.id))
        {
            return Err(StoreError::Conflict(format!(
                "flight {} has live or paid bookings",
                flight_number
            )));
        }

        let doomed: BTreeSet<Uuid> = bookings.iter().map(|b| b.id).collect();
        db.tickets.retain(|_, t| !doomed.contains(&t.ticket.booking_id));
        db.bookings.retain(|id, _| !doomed.contains(id));
        db.flights.remove(flight_number);
        Ok(())
    }

    async fn live_occupancy(&self, flight_number: &str) -> StoreResult<CabinOccupancy> {
        let db = self.tables.lock().await;
        let mut occupancy = CabinOccupancy::default();
        for ticket in db.live_tickets(flight_number) {
            occupancy.add(db.booking_of(ticket)?.cabin_class, 1);
        }
        Ok(occupancy)
    }

    async fn occupancy_by_flight(&self) -> StoreResult<HashMap<String, CabinOccupancy>> {
        let db = self.tables.lock().await;
        let mut by_flight: HashMap<String, CabinOccupancy> = HashMap::new();
        for stored in db.tickets.values().filter(|t| !t.released) {
            let cabin = db.booking_of(&stored.ticket)?.cabin_class;
            by_flight
                .entry(stored.ticket.flight_number.clone())
                .or_default()
                .add(cabin, 1);
        }
        Ok(by_flight)
    }

    async fn taken_seat_numbers(&self, flight_number: &str) -> StoreResult<BTreeSet<String>> {
        let db = self.tables.lock().await;
        Ok(db
            .live_tickets(flight_number)
            .map(|t| t.seat_number.clone())
            .collect())
    }

    async fn insert_booking(&self, booking: &Booking, tickets: &[Ticket]) -> StoreResult<()> {
        let mut db = self.tables.lock().await;
        if !db.flights.contains_key(&booking.flight_number) {
            return Err(StoreError::NotFound(format!("flight {}", booking.flight_number)));
        }

        let mut taken: BTreeSet<String> = db
            .live_tickets(&booking.flight_number)
            .map(|t| t.seat_number.clone())
            .collect();
        for ticket in tickets {
            if !taken.insert(ticket.seat_number.clone()) {
                return Err(StoreError::Conflict(format!(
                    "seat {} is already taken on flight {}",
                    ticket.seat_number, booking.flight_number
                )));
            }
        }

        db.bookings.insert(booking.id, booking.clone());
        for ticket in tickets {
            db.tickets.insert(
                ticket.id,
                StoredTicket {
                    ticket: ticket.clone(),
                    released: false,
                },
            );
        }
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn get_booking_tickets(&self, booking_id: Uuid) -> StoreResult<Vec<Ticket>> {
        let db = self.tables.lock().await;
        let mut tickets: Vec<Ticket> = db
            .tickets
            .values()
            .filter(|t| t.ticket.booking_id == booking_id)
            .map(|t| t.ticket.clone())
            .collect();
        tickets.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
        Ok(tickets)
    }

    async fn get_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        Ok(self.tables.lock().await.tickets.get(&id).map(|t| t.ticket.clone()))
    }

    async fn get_payment(&self, booking_id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(self.tables.lock().await.payments.get(&booking_id).cloned())
    }

    async fn list_bookings_for_passenger(&self, passenger_id: &str) -> StoreResult<Vec<Booking>> {
        let db = self.tables.lock().await;
        let mut bookings: Vec<Booking> = db
            .bookings
            .values()
            .filter(|b| b.passenger_id.as_deref() == Some(passenger_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn remove_ticket(&self, ticket_id: Uuid) -> StoreResult<RemovalOutcome> {
        let mut db = self.tables.lock().await;
        let ticket = db
            .tickets
            .get(&ticket_id)
            .map(|t| t.ticket.clone())
            .ok_or_else(|| StoreError::NotFound(format!("ticket {}", ticket_id)))?;

        let mut booking = db.booking_of(&ticket)?.clone();
        if booking.is_cancelled() {
            return Ok(RemovalOutcome::BookingAlreadyCancelled(booking));
        }

        db.tickets.remove(&ticket_id);
        if booking.release_one_ticket() {
            db.release_tickets(booking.id);
        }
        db.bookings.insert(booking.id, booking.clone());

        Ok(RemovalOutcome::Removed { ticket, booking })
    }

    async fn confirm_payment(&self, booking_id: Uuid, payment: &Payment) -> StoreResult<PaymentOutcome> {
        let mut db = self.tables.lock().await;
        let booking = db
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking_id)))?;

        match booking.payment_transition() {
            PaymentTransition::Confirm => {
                if db.payments.contains_key(&booking_id) {
                    return Err(StoreError::Conflict(format!(
                        "booking {} already has a payment",
                        booking_id
                    )));
                }
                let mut confirmed = booking;
                confirmed.status = BookingStatus::Confirmed;
                db.payments.insert(booking_id, payment.clone());
                db.bookings.insert(booking_id, confirmed.clone());
                Ok(PaymentOutcome::Confirmed {
                    booking: confirmed,
                    payment: payment.clone(),
                })
            }
            PaymentTransition::AlreadyConfirmed => Ok(PaymentOutcome::AlreadyConfirmed(booking)),
            PaymentTransition::Reject => Ok(PaymentOutcome::Rejected(booking)),
        }
    }

    async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Uuid>> {
        let mut db = self.tables.lock().await;
        let mut cancelled = Vec::new();
        for booking in db.bookings.values_mut() {
            if booking.status == BookingStatus::Pending && booking.created_at < cutoff {
                booking.status = BookingStatus::Cancelled;
                cancelled.push(booking.id);
            }
        }
        for id in &cancelled {
            db.release_tickets(*id);
        }
        Ok(cancelled)
    }

    async fn flight_manifest(&self, flight_number: &str) -> StoreResult<Vec<TicketWithBooking>> {
        let db = self.tables.lock().await;
        let mut rows = Vec::new();
        for ticket in db.live_tickets(flight_number) {
            rows.push(TicketWithBooking {
                ticket: ticket.clone(),
                booking: db.booking_of(ticket)?.clone(),
            });
        }
        rows.sort_by(|a, b| a.ticket.seat_number.cmp(&b.ticket.seat_number));
        Ok(rows)
    }
}
