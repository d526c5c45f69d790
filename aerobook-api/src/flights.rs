use aerobook_catalog::{FlightSearchResults, SeatAvailability, SeatMap};
use aerobook_core::{search::FlightSearchCriteria, Flight};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct SeatsResponse {
    pub flight_number: String,
    pub taken_seats: Vec<String>,
    pub seat_map: SeatMap,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights/search", get(search_flights))
        .route("/v1/flights/{flight_number}", get(get_flight))
        .route("/v1/flights/{flight_number}/availability", get(get_availability))
        .route("/v1/flights/{flight_number}/seats", get(get_seats))
}

async fn search_flights(
    State(state): State<AppState>,
    Query(criteria): Query<FlightSearchCriteria>,
) -> Result<Json<FlightSearchResults>, AppError> {
    let results = state.schedule.search(&criteria).await?;
    tracing::debug!(
        "Search {} -> {} returned {} flights",
        criteria.origin,
        criteria.destination,
        results.flights.len()
    );
    Ok(Json(results))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.schedule.get_flight(&flight_number).await?))
}

async fn get_availability(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
) -> Result<Json<SeatAvailability>, AppError> {
    Ok(Json(state.inventory.available_seats(&flight_number).await?))
}

async fn get_seats(
    State(state): State<AppState>,
    Path(flight_number): Path<String>,
) -> Result<Json<SeatsResponse>, AppError> {
    let aircraft = state.inventory.aircraft_for(&flight_number).await?;
    let taken = state.inventory.taken_seat_numbers(&flight_number).await?;

    Ok(Json(SeatsResponse {
        flight_number,
        taken_seats: taken.into_iter().collect(),
        seat_map: SeatMap::for_aircraft(&aircraft),
    }))
}
