use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use crate::domain::models::booking::{Booking, NewBookingParams};
use crate::domain::ports::{BookingRepository, SlotRepository};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub student_id: String,
    pub slot_id: String,
    pub payment_ref: String,
    pub amount: i64,
}

/// A reused booking is the idempotent answer to a repeated request, not an error.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Created(Booking),
    Reused(Booking),
}

impl BookingOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            BookingOutcome::Created(b) | BookingOutcome::Reused(b) => b,
        }
    }

    pub fn into_booking(self) -> Booking {
        match self {
            BookingOutcome::Created(b) | BookingOutcome::Reused(b) => b,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, BookingOutcome::Reused(_))
    }
}

pub struct BookingLedger {
    slots: Arc<dyn SlotRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingLedger {
    pub fn new(slots: Arc<dyn SlotRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { slots, bookings }
    }

    pub async fn create_booking(&self, request: CreateBooking, now: DateTime<Utc>) -> Result<BookingOutcome, AppError> {
        if request.student_id.trim().is_empty() {
            return Err(AppError::Validation("student_id is required".into()));
        }
        if request.payment_ref.trim().is_empty() {
            return Err(AppError::Validation("payment_ref is required".into()));
        }
        if request.amount < 0 {
            return Err(AppError::Validation("amount must not be negative".into()));
        }

        if let Some(existing) = self.bookings.find_active(&request.student_id, &request.slot_id).await? {
            info!(booking_id = %existing.id, slot_id = %request.slot_id, "Reusing active booking");
            return Ok(BookingOutcome::Reused(existing));
        }

        let slot = self.slots.find_by_id(&request.slot_id).await?
            .ok_or(AppError::NotFound(format!("Slot {} not found", request.slot_id)))?;

        // Early answer only; the guarded increment decides at commit time.
        slot.check_admission(now)?;

        let booking = Booking::new(NewBookingParams {
            student_id: request.student_id.clone(),
            slot_id: slot.id.clone(),
            teacher_id: slot.teacher_id.clone(),
            payment_ref: request.payment_ref,
            amount: request.amount,
        });

        match self.bookings.reserve_and_insert(&booking, now).await {
            Ok(created) => {
                info!(booking_id = %created.id, slot_id = %created.slot_id, payment_status = %created.payment_status, "Booking created");
                Ok(BookingOutcome::Created(created))
            }
            Err(AppError::DuplicateReservation(msg)) => {
                warn!(slot_id = %slot.id, student_id = %request.student_id, "Concurrent duplicate reservation: {}", msg);
                let winner = self.bookings.find_active(&request.student_id, &request.slot_id).await?
                    .ok_or(AppError::Conflict("Reservation is being processed, retry shortly".into()))?;
                Ok(BookingOutcome::Reused(winner))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find(&self, id: &str) -> Result<Booking, AppError> {
        self.bookings.find_by_id(id).await?
            .ok_or(AppError::NotFound(format!("Booking {} not found", id)))
    }
}
