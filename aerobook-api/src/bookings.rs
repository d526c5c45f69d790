use aerobook_core::{Actor, PaymentMethod};
use aerobook_order::{
    BookingDetails, BookingReceipt, CancellationOutcome, MyBookings, NewBookingRequest,
    PaymentQuote, PaymentResult,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub method: PaymentMethod,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(my_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/payment", get(payment_quote))
        .route("/v1/bookings/{id}/pay", post(pay_booking))
        .route("/v1/tickets/{id}", delete(cancel_ticket))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<NewBookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = state.ledger.create_booking(&actor, req, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn my_bookings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<MyBookings>, AppError> {
    Ok(Json(state.ledger.my_bookings(&actor, Utc::now()).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetails>, AppError> {
    Ok(Json(state.ledger.booking_details(id, &actor).await?))
}

async fn payment_quote(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentQuote>, AppError> {
    Ok(Json(state.finalizer.quote(id, &actor).await?))
}

/// 201 when this call paid the booking, 200 when it was already confirmed.
async fn pay_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayRequest>,
) -> Result<(StatusCode, Json<PaymentResult>), AppError> {
    let result = state.finalizer.pay(id, &actor, req.method, Utc::now()).await?;
    let status = match result {
        PaymentResult::Paid { .. } => StatusCode::CREATED,
        PaymentResult::AlreadyConfirmed { .. } => StatusCode::OK,
    };
    Ok((status, Json(result)))
}

async fn cancel_ticket(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationOutcome>, AppError> {
    Ok(Json(state.cancellation.cancel_ticket(id, &actor, Utc::now()).await?))
}
