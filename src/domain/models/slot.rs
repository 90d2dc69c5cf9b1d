use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use crate::error::AppError;

/// A teacher's bookable unit for one date and one time bucket.
///
/// `current_bookings` only moves inside the reservation transaction and is
/// bounded by `max_capacity` at the storage level unless `is_unlimited` is set.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Slot {
    pub id: String,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub time_slot_id: i32,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub is_unlimited: bool,
    pub booking_deadline: Option<DateTime<Utc>>,
    pub is_available: bool,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewSlotParams {
    pub teacher_id: String,
    pub date: NaiveDate,
    pub time_slot_id: i32,
    pub max_capacity: i32,
    pub is_unlimited: bool,
    pub booking_deadline: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub description: Option<String>,
}

/// A booking deadline still admits bookings at the exact instant it names.
pub fn deadline_passed(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|d| d < now)
}

impl Slot {
    pub fn new(params: NewSlotParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            teacher_id: params.teacher_id,
            date: params.date,
            time_slot_id: params.time_slot_id,
            max_capacity: params.max_capacity,
            current_bookings: 0,
            is_unlimited: params.is_unlimited,
            booking_deadline: params.booking_deadline,
            is_available: true,
            topic: params.topic,
            description: params.description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        deadline_passed(self.booking_deadline, now)
    }

    pub fn is_full(&self) -> bool {
        !self.is_unlimited && self.current_bookings >= self.max_capacity
    }

    /// Classifies why a seat cannot be granted right now.
    ///
    /// Used both as the cheap pre-check and to explain a guarded increment
    /// that matched zero rows. Closed wins over full.
    pub fn check_admission(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if !self.is_available || self.deadline_passed(now) {
            return Err(AppError::SlotClosed(format!("Slot {} is closed for booking", self.id)));
        }
        if self.is_full() {
            return Err(AppError::SlotFull(format!(
                "Slot {} is full ({}/{})",
                self.id, self.current_bookings, self.max_capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn slot(max_capacity: i32, current: i32, unlimited: bool) -> Slot {
        let mut slot = Slot::new(NewSlotParams {
            teacher_id: "t-1".into(),
            date: NaiveDate::from_ymd_opt(2030, 5, 6).unwrap(),
            time_slot_id: 1,
            max_capacity,
            is_unlimited: unlimited,
            booking_deadline: None,
            topic: None,
            description: None,
        });
        slot.current_bookings = current;
        slot
    }

    #[test]
    fn test_admission_rejects_full_slot() {
        let err = slot(2, 2, false).check_admission(Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::SlotFull(_)));
    }

    #[test]
    fn test_unlimited_slot_ignores_capacity() {
        assert!(slot(1, 40, true).check_admission(Utc::now()).is_ok());
    }

    #[test]
    fn test_closed_takes_precedence_over_full() {
        let mut s = slot(1, 1, false);
        s.booking_deadline = Some(Utc::now() - Duration::minutes(1));
        let err = s.check_admission(Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::SlotClosed(_)));

        let mut s = slot(3, 0, false);
        s.is_available = false;
        assert!(matches!(s.check_admission(Utc::now()), Err(AppError::SlotClosed(_))));
    }
}
