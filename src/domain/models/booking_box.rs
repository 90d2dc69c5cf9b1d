use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoxStatus {
    Open,
    Partial,
    Closed,
    Approved,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BoxEntry {
    pub booking_id: String,
    pub student_id: String,
    pub payment_status: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Read-time projection of one slot and its bookings. Never persisted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingBox {
    pub slot_id: String,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub time_slot_id: i32,
    pub time_label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub topic: Option<String>,
    pub max_capacity: i32,
    pub is_unlimited: bool,
    pub is_available: bool,
    pub seats_taken: i32,
    pub current_bookings: i32,
    pub approved_bookings: i32,
    pub booking_deadline: Option<DateTime<Utc>>,
    pub status: BoxStatus,
    pub meeting_start: Option<DateTime<Utc>>,
    pub minutes_until_meeting: Option<i64>,
    pub hours_until_deadline: Option<f64>,
    pub meeting_link: Option<String>,
    pub bookings: Vec<BoxEntry>,
}
