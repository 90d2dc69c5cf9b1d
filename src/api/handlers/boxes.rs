use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{ApproveBoxRequest, PendingBoxesQuery};
use crate::api::dtos::responses::{AutoCloseResponse, CloseBoxResponse};
use crate::domain::ports::MeetingRef;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn list_pending_boxes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<PendingBoxesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let boxes = state.boxes.pending_boxes(Utc::now(), query.include_approved).await?;
    Ok(Json(boxes))
}

pub async fn get_box(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking_box = state.boxes.box_for_slot(&slot_id, Utc::now()).await?;
    Ok(Json(booking_box))
}

pub async fn approve_box(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(slot_id): Path<String>,
    payload: Option<Json<ApproveBoxRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let meeting = payload.meeting_link.map(|link| MeetingRef {
        link: link.trim().to_string(),
        event_id: payload.meeting_event_id,
    });

    info!(slot_id = %slot_id, admin_id = %admin.id, explicit_link = meeting.is_some(), "approve_box");
    let outcome = state.approvals.approve_box(&slot_id, &admin.id, meeting, Utc::now()).await?;
    Ok(Json(outcome))
}

pub async fn close_box(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slot = state.approvals.close_box(&slot_id).await?;
    info!(slot_id = %slot.id, admin_id = %admin.id, "close_box");
    Ok(Json(CloseBoxResponse { slot_id: slot.id, closed: !slot.is_available }))
}

pub async fn auto_close(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let closed_count = state.reconciler.auto_close(Utc::now()).await?;
    Ok(Json(AutoCloseResponse { closed_count }))
}

pub async fn auto_approve(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let report = state.reconciler.auto_approve(Utc::now()).await?;
    Ok(Json(report))
}
