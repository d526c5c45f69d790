use aerobook_core::{Actor, Aircraft, Airport, Flight, FlightStatus, NewAircraft};
use aerobook_order::{CancellationOutcome, Manifest, ManifestQuery, ReportSnapshot};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: FlightStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/airports", post(create_airport))
        .route("/v1/admin/airports/{code}", delete(delete_airport))
        .route("/v1/admin/aircraft", post(create_aircraft))
        .route("/v1/admin/aircraft/{id}", delete(delete_aircraft))
        .route("/v1/admin/flights", post(create_flight))
        .route("/v1/admin/flights/{flight_number}", delete(delete_flight))
        .route("/v1/admin/flights/{flight_number}/status", put(update_flight_status))
        .route("/v1/admin/flights/{flight_number}/manifest", get(flight_manifest))
        .route("/v1/admin/tickets/{id}", delete(remove_passenger))
        .route("/v1/admin/reports", get(reports))
}

// ============================================================================
// Schedule
// ============================================================================

async fn create_airport(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(airport): Json<Airport>,
) -> Result<(StatusCode, Json<Airport>), AppError> {
    let airport = state.schedule.create_airport(&actor, airport).await?;
    Ok((StatusCode::CREATED, Json(airport)))
}

async fn delete_airport(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.schedule.delete_airport(&actor, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_aircraft(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(aircraft): Json<NewAircraft>,
) -> Result<(StatusCode, Json<Aircraft>), AppError> {
    let aircraft = state.schedule.create_aircraft(&actor, aircraft).await?;
    Ok((StatusCode::CREATED, Json(aircraft)))
}

async fn delete_aircraft(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.schedule.delete_aircraft(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_flight(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(flight): Json<Flight>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let flight = state.schedule.create_flight(&actor, flight).await?;
    Ok((StatusCode::CREATED, Json(flight)))
}

async fn update_flight_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(flight_number): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Flight>, AppError> {
    let flight = state
        .schedule
        .update_flight_status(&actor, &flight_number, req.status)
        .await?;
    Ok(Json(flight))
}

async fn delete_flight(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(flight_number): Path<String>,
) -> Result<StatusCode, AppError> {
    state.schedule.delete_flight(&actor, &flight_number).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Operations
// ============================================================================

async fn flight_manifest(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(flight_number): Path<String>,
    Query(query): Query<ManifestQuery>,
) -> Result<Json<Manifest>, AppError> {
    let manifest = state
        .manifest
        .flight_manifest(&actor, &flight_number, &query)
        .await?;
    Ok(Json(manifest))
}

async fn remove_passenger(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationOutcome>, AppError> {
    Ok(Json(state.cancellation.remove_passenger(id, &actor).await?))
}

async fn reports(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ReportSnapshot>, AppError> {
    Ok(Json(state.reports.snapshot(&actor, Utc::now()).await?))
}
