use aerobook_core::repository::{
    BookingStore, CabinOccupancy, PaymentOutcome, RemovalOutcome, StoreError, StoreResult,
    TicketWithBooking,
};
use aerobook_core::{
    Aircraft, Airport, Booking, BookingStatus, CabinClass, Flight, FlightStatus, NewAircraft,
    PassengerDetails, Payment, PaymentTransition, Ticket,
};
use aerobook_shared::Masked;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => {
            tracing::error!("Database error: {}", err);
            StoreError::Backend(err.to_string())
        }
    }
}

fn parse_cabin(raw: &str) -> StoreResult<CabinClass> {
    raw.parse()
        .map_err(|e: aerobook_core::flight::UnknownCabinClass| StoreError::Integrity(e.to_string()))
}

fn to_u32(value: i32, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Integrity(format!("negative {}: {}", column, value)))
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    code: String,
    name: String,
    city: String,
    country: String,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            code: row.code,
            name: row.name,
            city: row.city,
            country: row.country,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AircraftRow {
    id: i64,
    model: String,
    economy_seats: i32,
    business_seats: i32,
    first_seats: i32,
}

impl TryFrom<AircraftRow> for Aircraft {
    type Error = StoreError;

    fn try_from(row: AircraftRow) -> StoreResult<Self> {
        Ok(Aircraft {
            id: row.id,
            model: row.model,
            economy_seats: to_u32(row.economy_seats, "economy_seats")?,
            business_seats: to_u32(row.business_seats, "business_seats")?,
            first_seats: to_u32(row.first_seats, "first_seats")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    flight_number: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    economy_price: i64,
    business_price: i64,
    first_class_price: i64,
    status: String,
    aircraft_id: i64,
    departure_airport: String,
    arrival_airport: String,
}

impl TryFrom<FlightRow> for Flight {
    type Error = StoreError;

    fn try_from(row: FlightRow) -> StoreResult<Self> {
        let status: FlightStatus = row
            .status
            .parse()
            .map_err(|e: aerobook_core::CoreError| StoreError::Integrity(e.to_string()))?;
        Ok(Flight {
            flight_number: row.flight_number,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            economy_price: row.economy_price,
            business_price: row.business_price,
            first_class_price: row.first_class_price,
            departure_airport: row.departure_airport,
            arrival_airport: row.arrival_airport,
            aircraft_id: row.aircraft_id,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    flight_number: String,
    passenger_id: Option<String>,
    cabin_class: String,
    number_of_passengers: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> StoreResult<Self> {
        let status: BookingStatus = row
            .status
            .parse()
            .map_err(|e: aerobook_core::CoreError| StoreError::Integrity(e.to_string()))?;
        Ok(Booking {
            id: row.id,
            flight_number: row.flight_number,
            passenger_id: row.passenger_id,
            cabin_class: parse_cabin(&row.cabin_class)?,
            number_of_passengers: to_u32(row.number_of_passengers, "number_of_passengers")?,
            status,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    booking_id: Uuid,
    flight_number: String,
    seat_number: String,
    passenger_name: String,
    passport: String,
    national_id: String,
    date_of_birth: NaiveDate,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            id: row.id,
            booking_id: row.booking_id,
            flight_number: row.flight_number,
            seat_number: row.seat_number,
            passenger: PassengerDetails {
                passenger_name: row.passenger_name,
                passport: Masked::new(row.passport),
                national_id: Masked::new(row.national_id),
                date_of_birth: row.date_of_birth,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    method: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> StoreResult<Self> {
        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            method: row
                .method
                .parse()
                .map_err(|e: aerobook_core::CoreError| StoreError::Integrity(e.to_string()))?,
            created_at: row.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str =
    "id, flight_number, passenger_id, cabin_class, number_of_passengers, status, created_at";
const TICKET_COLUMNS: &str =
    "id, booking_id, flight_number, seat_number, passenger_name, passport, national_id, date_of_birth";
const FLIGHT_COLUMNS: &str = "flight_number, departure_time, arrival_time, economy_price, business_price, first_class_price, status, aircraft_id, departure_airport, arrival_airport";

async fn lock_booking(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> StoreResult<Option<Booking>> {
    let row: Option<BookingRow> = sqlx::query_as(&format!(
        "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
        BOOKING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_error)?;

    row.map(Booking::try_from).transpose()
}

async fn exists(pool: &PgPool, sql: &str, key: &str) -> StoreResult<bool> {
    let found: Option<i32> = sqlx::query_scalar(sql)
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(db_error)?;
    Ok(found.is_some())
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create_airport(&self, airport: &Airport) -> StoreResult<()> {
        sqlx::query("INSERT INTO airports (code, name, city, country) VALUES ($1, $2, $3, $4)")
            .bind(&airport.code)
            .bind(&airport.name)
            .bind(&airport.city)
            .bind(&airport.country)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn get_airport(&self, code: &str) -> StoreResult<Option<Airport>> {
        let row: Option<AirportRow> =
            sqlx::query_as("SELECT code, name, city, country FROM airports WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(row.map(Airport::from))
    }

    async fn delete_airport(&self, code: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM airports WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("airport {}", code)));
        }
        Ok(())
    }

    async fn create_aircraft(&self, aircraft: &NewAircraft) -> StoreResult<Aircraft> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO aircraft (model, economy_seats, business_seats, first_seats) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&aircraft.model)
        .bind(aircraft.economy_seats as i32)
        .bind(aircraft.business_seats as i32)
        .bind(aircraft.first_seats as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(Aircraft::from_new(id, aircraft))
    }

    async fn get_aircraft(&self, id: i64) -> StoreResult<Option<Aircraft>> {
        let row: Option<AircraftRow> = sqlx::query_as(
            "SELECT id, model, economy_seats, business_seats, first_seats FROM aircraft WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Aircraft::try_from).transpose()
    }

    async fn delete_aircraft(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM aircraft WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("aircraft {}", id)));
        }
        Ok(())
    }

    async fn create_flight(&self, flight: &Flight) -> StoreResult<()> {
        let aircraft_found: Option<i64> = sqlx::query_scalar("SELECT id FROM aircraft WHERE id = $1")
            .bind(flight.aircraft_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        if aircraft_found.is_none() {
            return Err(StoreError::NotFound(format!("aircraft {}", flight.aircraft_id)));
        }
        for code in [&flight.departure_airport, &flight.arrival_airport] {
            if !exists(&self.pool, "SELECT 1 FROM airports WHERE code = $1", code).await? {
                return Err(StoreError::NotFound(format!("airport {}", code)));
            }
        }

        sqlx::query(&format!(
            "INSERT INTO flights ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            FLIGHT_COLUMNS
        ))
        .bind(&flight.flight_number)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.economy_price)
        .bind(flight.business_price)
        .bind(flight.first_class_price)
        .bind(flight.status.as_str())
        .bind(flight.aircraft_id)
        .bind(&flight.departure_airport)
        .bind(&flight.arrival_airport)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_flight(&self, flight_number: &str) -> StoreResult<Option<Flight>> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights WHERE flight_number = $1",
            FLIGHT_COLUMNS
        ))
        .bind(flight_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Flight::try_from).transpose()
    }

    async fn list_flights(&self) -> StoreResult<Vec<Flight>> {
        let rows: Vec<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights ORDER BY departure_time",
            FLIGHT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(Flight::try_from).collect()
    }

    async fn update_flight_status(&self, flight_number: &str, status: FlightStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE flights SET status = $2 WHERE flight_number = $1")
            .bind(flight_number)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("flight {}", flight_number)));
        }
        Ok(())
    }

    async fn delete_flight(&self, flight_number: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let locked: Option<String> =
            sqlx::query_scalar("SELECT flight_number FROM flights WHERE flight_number = $1 FOR UPDATE")
                .bind(flight_number)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        if locked.is_none() {
            return Err(StoreError::NotFound(format!("flight {}", flight_number)));
        }

        let blocking: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings b
            WHERE b.flight_number = $1
              AND (b.status <> 'CANCELLED' OR EXISTS (SELECT 1 FROM payments p WHERE p.booking_id = b.id))
            "#,
        )
        .bind(flight_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        if blocking > 0 {
            return Err(StoreError::Conflict(format!(
                "flight {} has live or paid bookings",
                flight_number
            )));
        }

        // Tickets go with their bookings (ON DELETE CASCADE).
        sqlx::query("DELETE FROM bookings WHERE flight_number = $1")
            .bind(flight_number)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        sqlx::query("DELETE FROM flights WHERE flight_number = $1")
            .bind(flight_number)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn live_occupancy(&self, flight_number: &str) -> StoreResult<CabinOccupancy> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT b.cabin_class, COUNT(t.id)
            FROM tickets t JOIN bookings b ON b.id = t.booking_id
            WHERE t.flight_number = $1 AND NOT t.released
            GROUP BY b.cabin_class
            "#,
        )
        .bind(flight_number)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut occupancy = CabinOccupancy::default();
        for (cabin, sold) in rows {
            occupancy.add(parse_cabin(&cabin)?, sold as u32);
        }
        Ok(occupancy)
    }

    async fn occupancy_by_flight(&self) -> StoreResult<HashMap<String, CabinOccupancy>> {
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT t.flight_number, b.cabin_class, COUNT(t.id)
            FROM tickets t JOIN bookings b ON b.id = t.booking_id
            WHERE NOT t.released
            GROUP BY t.flight_number, b.cabin_class
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut by_flight: HashMap<String, CabinOccupancy> = HashMap::new();
        for (flight_number, cabin, sold) in rows {
            by_flight
                .entry(flight_number)
                .or_default()
                .add(parse_cabin(&cabin)?, sold as u32);
        }
        Ok(by_flight)
    }

    async fn taken_seat_numbers(&self, flight_number: &str) -> StoreResult<BTreeSet<String>> {
        let seats: Vec<String> = sqlx::query_scalar(
            "SELECT seat_number FROM tickets WHERE flight_number = $1 AND NOT released",
        )
        .bind(flight_number)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(seats.into_iter().collect())
    }

    async fn insert_booking(&self, booking: &Booking, tickets: &[Ticket]) -> StoreResult<()> {
        if !exists(&self.pool, "SELECT 1 FROM flights WHERE flight_number = $1", &booking.flight_number).await? {
            return Err(StoreError::NotFound(format!("flight {}", booking.flight_number)));
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(&format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            BOOKING_COLUMNS
        ))
        .bind(booking.id)
        .bind(&booking.flight_number)
        .bind(&booking.passenger_id)
        .bind(booking.cabin_class.as_str())
        .bind(booking.number_of_passengers as i32)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for ticket in tickets {
            sqlx::query(&format!(
                "INSERT INTO tickets ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                TICKET_COLUMNS
            ))
            .bind(ticket.id)
            .bind(ticket.booking_id)
            .bind(&ticket.flight_number)
            .bind(&ticket.seat_number)
            .bind(&ticket.passenger.passenger_name)
            .bind(ticket.passenger.passport.expose())
            .bind(ticket.passenger.national_id.expose())
            .bind(ticket.passenger.date_of_birth)
            .execute(&mut *tx)
            .await
            .map_err(|e| match db_error(e) {
                StoreError::Conflict(_) => StoreError::Conflict(format!(
                    "seat {} is already taken on flight {}",
                    ticket.seat_number, ticket.flight_number
                )),
                other => other,
            })?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn get_booking_tickets(&self, booking_id: Uuid) -> StoreResult<Vec<Ticket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tickets WHERE booking_id = $1 ORDER BY seat_number",
            TICKET_COLUMNS
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    async fn get_ticket(&self, id: Uuid) -> StoreResult<Option<Ticket>> {
        let row: Option<TicketRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tickets WHERE id = $1",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Ticket::from))
    }

    async fn get_payment(&self, booking_id: Uuid) -> StoreResult<Option<Payment>> {
        let row: Option<PaymentRow> = sqlx::query_as(
            "SELECT id, booking_id, method, created_at FROM payments WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_bookings_for_passenger(&self, passenger_id: &str) -> StoreResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE passenger_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn remove_ticket(&self, ticket_id: Uuid) -> StoreResult<RemovalOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let booking_id: Option<Uuid> = sqlx::query_scalar("SELECT booking_id FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        let booking_id = booking_id.ok_or_else(|| StoreError::NotFound(format!("ticket {}", ticket_id)))?;

        let mut booking = lock_booking(&mut tx, booking_id)
            .await?
            .ok_or_else(|| StoreError::Integrity(format!("ticket {} has no booking", ticket_id)))?;
        if booking.is_cancelled() {
            return Ok(RemovalOutcome::BookingAlreadyCancelled(booking));
        }

        let deleted: Option<TicketRow> = sqlx::query_as(&format!(
            "DELETE FROM tickets WHERE id = $1 RETURNING {}",
            TICKET_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let ticket = deleted
            .map(Ticket::from)
            .ok_or_else(|| StoreError::NotFound(format!("ticket {}", ticket_id)))?;

        let cancelled = booking.release_one_ticket();
        sqlx::query("UPDATE bookings SET number_of_passengers = $2, status = $3 WHERE id = $1")
            .bind(booking.id)
            .bind(booking.number_of_passengers as i32)
            .bind(booking.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        if cancelled {
            sqlx::query("UPDATE tickets SET released = TRUE WHERE booking_id = $1")
                .bind(booking.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(RemovalOutcome::Removed { ticket, booking })
    }

    async fn confirm_payment(&self, booking_id: Uuid, payment: &Payment) -> StoreResult<PaymentOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let mut booking = lock_booking(&mut tx, booking_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking_id)))?;

        match booking.payment_transition() {
            PaymentTransition::Confirm => {
                sqlx::query(
                    "INSERT INTO payments (id, booking_id, method, created_at) VALUES ($1, $2, $3, $4)",
                )
                .bind(payment.id)
                .bind(booking_id)
                .bind(payment.method.as_str())
                .bind(payment.created_at)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

                sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
                    .bind(booking_id)
                    .bind(BookingStatus::Confirmed.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;

                tx.commit().await.map_err(db_error)?;
                booking.status = BookingStatus::Confirmed;
                Ok(PaymentOutcome::Confirmed {
                    booking,
                    payment: payment.clone(),
                })
            }
            PaymentTransition::AlreadyConfirmed => Ok(PaymentOutcome::AlreadyConfirmed(booking)),
            PaymentTransition::Reject => Ok(PaymentOutcome::Rejected(booking)),
        }
    }

    async fn cancel_stale_pending(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // The status predicate is evaluated against the row at write time.
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE bookings SET status = 'CANCELLED' WHERE status = 'PENDING' AND created_at < $1 RETURNING id",
        )
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;

        if !ids.is_empty() {
            sqlx::query("UPDATE tickets SET released = TRUE WHERE booking_id = ANY($1)")
                .bind(&ids)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(ids)
    }

    async fn flight_manifest(&self, flight_number: &str) -> StoreResult<Vec<TicketWithBooking>> {
        let tickets: Vec<TicketRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tickets WHERE flight_number = $1 AND NOT released ORDER BY seat_number",
            TICKET_COLUMNS
        ))
        .bind(flight_number)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let booking_ids: Vec<Uuid> = tickets
            .iter()
            .map(|t| t.booking_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let booking_rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = ANY($1)",
            BOOKING_COLUMNS
        ))
        .bind(&booking_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut bookings = HashMap::new();
        for row in booking_rows {
            let booking = Booking::try_from(row)?;
            bookings.insert(booking.id, booking);
        }

        tickets
            .into_iter()
            .map(|row| -> StoreResult<TicketWithBooking> {
                let booking = bookings.get(&row.booking_id).cloned().ok_or_else(|| {
                    StoreError::Integrity(format!("ticket {} has no booking", row.id))
                })?;
                Ok(TicketWithBooking {
                    ticket: Ticket::from(row),
                    booking,
                })
            })
            .collect()
    }
}
