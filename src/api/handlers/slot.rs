use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminUser;
use crate::api::dtos::requests::{CreateSlotRequest, TeacherSlotsQuery};
use crate::domain::models::slot::{NewSlotParams, Slot};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_time_slots(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let time_slots = state.time_slots.active().await?;
    Ok(Json(time_slots))
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(payload): Json<CreateSlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.teacher_id.trim().is_empty() {
        return Err(AppError::Validation("teacher_id is required".into()));
    }
    if !payload.is_unlimited && payload.max_capacity < 1 {
        return Err(AppError::Validation("max_capacity must be at least 1 unless the slot is unlimited".into()));
    }
    match state.time_slots.get(payload.time_slot_id).await? {
        Some(ts) if ts.is_active => {}
        Some(_) => return Err(AppError::Validation(format!("Time slot {} is no longer offered", payload.time_slot_id))),
        None => return Err(AppError::Validation(format!("Unknown time slot {}", payload.time_slot_id))),
    }

    let slot = Slot::new(NewSlotParams {
        teacher_id: payload.teacher_id,
        date: payload.date,
        time_slot_id: payload.time_slot_id,
        max_capacity: payload.max_capacity.max(0),
        is_unlimited: payload.is_unlimited,
        booking_deadline: payload.booking_deadline,
        topic: payload.topic,
        description: payload.description,
    });

    let created = state.slot_repo.create(&slot).await?;
    info!(slot_id = %created.id, teacher_id = %created.teacher_id, admin_id = %admin.id, "Slot created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slot = state.slot_repo.find_by_id(&slot_id).await?
        .ok_or(AppError::NotFound(format!("Slot {} not found", slot_id)))?;
    Ok(Json(slot))
}

pub async fn list_teacher_slots(
    State(state): State<Arc<AppState>>,
    Path(teacher_id): Path<String>,
    Query(range): Query<TeacherSlotsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if range.from > range.to {
        return Err(AppError::Validation("from must not be after to".into()));
    }
    let slots = state.slot_repo.list_by_teacher(&teacher_id, range.from, range.to).await?;
    Ok(Json(slots))
}
