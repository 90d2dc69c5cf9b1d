use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub student_id: String,
    pub slot_id: String,
    /// Payment reference from the gateway, or `"free"` for free sessions.
    pub payment_ref: String,
    #[serde(default)]
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub teacher_id: String,
    pub date: NaiveDate,
    pub time_slot_id: i32,
    #[serde(default)]
    pub max_capacity: i32,
    #[serde(default)]
    pub is_unlimited: bool,
    pub booking_deadline: Option<DateTime<Utc>>,
    pub topic: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct TeacherSlotsQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Deserialize, Default)]
pub struct PendingBoxesQuery {
    #[serde(default)]
    pub include_approved: bool,
}

#[derive(Deserialize, Default)]
pub struct ApproveBoxRequest {
    pub meeting_link: Option<String>,
    pub meeting_event_id: Option<String>,
}
