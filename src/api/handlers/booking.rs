use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::BookingResponse;
use crate::domain::services::booking_ledger::CreateBooking;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(slot_id = %payload.slot_id, student_id = %payload.student_id, "create_booking");

    let outcome = state.ledger.create_booking(CreateBooking {
        student_id: payload.student_id,
        slot_id: payload.slot_id,
        payment_ref: payload.payment_ref,
        amount: payload.amount,
    }, Utc::now()).await?;

    let status = if outcome.is_reused() { StatusCode::OK } else { StatusCode::CREATED };
    let reused = outcome.is_reused();
    Ok((status, Json(BookingResponse { booking: outcome.into_booking(), reused })))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.ledger.find(&booking_id).await?;
    Ok(Json(booking))
}
