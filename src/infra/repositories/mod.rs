use crate::error::AppError;

pub mod sqlite_slot_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_reference_repo;

pub mod postgres_slot_repo;
pub mod postgres_booking_repo;
pub mod postgres_reference_repo;

/// Maps a failed booking insert onto the reservation errors.
///
/// The partial unique index on (student_id, slot_id) means another request
/// already holds the seat; a CHECK violation means the capacity constraint
/// caught an increment the guarded update let through.
pub(crate) fn reservation_error(e: sqlx::Error, slot_id: &str) -> AppError {
    let err = AppError::Database(e);
    if err.is_unique_violation() {
        AppError::DuplicateReservation(format!("Active booking already exists for slot {}", slot_id))
    } else if err.is_check_violation() {
        AppError::SlotFull(format!("Slot {} is full", slot_id))
    } else {
        err
    }
}

pub(crate) fn slot_create_error(e: sqlx::Error) -> AppError {
    let err = AppError::Database(e);
    if err.is_unique_violation() {
        AppError::Conflict("A slot already exists for this teacher, date and time slot".into())
    } else {
        err
    }
}

/// Explains a guarded increment that matched no row.
pub(crate) fn rejected_reservation(slot: Option<crate::domain::models::slot::Slot>, slot_id: &str, now: chrono::DateTime<chrono::Utc>) -> AppError {
    match slot {
        None => AppError::NotFound(format!("Slot {} not found", slot_id)),
        Some(slot) => match slot.check_admission(now) {
            Err(e) => e,
            Ok(()) => AppError::SlotFull(format!("Slot {} is full", slot_id)),
        },
    }
}
