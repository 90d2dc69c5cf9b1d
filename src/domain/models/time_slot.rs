use serde::{Deserialize, Serialize};
use chrono::NaiveTime;
use sqlx::FromRow;

/// Reference time bucket ("09:00 - 10:00") that slots point at.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct TimeSlot {
    pub id: i32,
    pub label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub sort_order: i32,
    pub is_active: bool,
}
