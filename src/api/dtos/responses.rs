use crate::domain::models::booking::Booking;
use serde::Serialize;

#[derive(Serialize)]
pub struct BookingResponse {
    pub booking: Booking,
    pub reused: bool,
}

#[derive(Serialize)]
pub struct CloseBoxResponse {
    pub slot_id: String,
    pub closed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCloseResponse {
    pub closed_count: u64,
}
