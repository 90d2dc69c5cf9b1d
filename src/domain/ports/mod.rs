use crate::domain::models::{
    booking::Booking, contact::Contact, slot::Slot, time_slot::TimeSlot,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait TimeSlotRepository: Send + Sync {
    /// Every bucket, retired ones included, in display order.
    async fn list_all(&self) -> Result<Vec<TimeSlot>, AppError>;
}

#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn find_contact(&self, id: &str) -> Result<Option<Contact>, AppError>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn create(&self, slot: &Slot) -> Result<Slot, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError>;
    async fn list_by_teacher(&self, teacher_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Slot>, AppError>;
    /// Slots that still hold at least one settled booking awaiting approval.
    async fn list_with_pending(&self) -> Result<Vec<Slot>, AppError>;
    /// Slots whose settled bookings are all approved.
    async fn list_fully_approved(&self) -> Result<Vec<Slot>, AppError>;
    /// Sets `is_available = false`. Existing bookings are not touched.
    async fn close(&self, id: &str) -> Result<Slot, AppError>;
    /// Closes every open slot whose deadline lies before `now`; returns the count.
    async fn close_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Active booking (paid or approved, not rejected) for the idempotency key.
    async fn find_active(&self, student_id: &str, slot_id: &str) -> Result<Option<Booking>, AppError>;
    /// Consumes a seat and inserts the booking in one transaction.
    ///
    /// Fails with `NotFound`, `SlotClosed`, `SlotFull`, or
    /// `DuplicateReservation` when the idempotency index rejects the row;
    /// in every failure case the seat counter is left unchanged.
    async fn reserve_and_insert(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_slot(&self, slot_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Bookings belonging to any slot that has pending or approved entries.
    async fn list_for_slots(&self, slot_ids: &[String]) -> Result<Vec<Booking>, AppError>;
    async fn find_slot_meeting(&self, slot_id: &str) -> Result<Option<MeetingRef>, AppError>;
    /// Atomically claims every settled pending booking of the slot.
    ///
    /// Only rows still `approval_status = 'pending'` inside the transaction are
    /// updated; the returned rows are exactly the ones this caller approved.
    async fn approve_pending(
        &self,
        slot_id: &str,
        approver_id: &str,
        meeting: Option<&MeetingRef>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError>;
    /// Gives approved bookings of the slot that still lack a link this meeting.
    async fn attach_missing_meeting(&self, slot_id: &str, meeting: &MeetingRef) -> Result<Vec<Booking>, AppError>;
    /// Flips both notification flags if they were still unset.
    async fn mark_notified(&self, booking_id: &str) -> Result<bool, AppError>;
    /// Counts a failed delivery so retries rotate through the backlog.
    async fn record_notify_failure(&self, booking_id: &str) -> Result<(), AppError>;
    /// Approved, linked and unnotified bookings, fewest failed attempts first.
    async fn list_unnotified_approved(&self, limit: i32) -> Result<Vec<Booking>, AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeetingRef {
    pub link: String,
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingInfo {
    pub event_id: String,
    pub joinable_link: String,
}

#[async_trait]
pub trait MeetingProvider: Send + Sync {
    async fn create_meeting(&self, request: &MeetingRequest) -> Result<MeetingInfo, AppError>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecipientRole {
    Student,
    Teacher,
}

/// Structured content for the notification collaborator; rendering is its job.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient_email: String,
    pub recipient_name: String,
    pub role: RecipientRole,
    pub booking_id: String,
    pub slot_date: NaiveDate,
    pub time_label: String,
    pub topic: Option<String>,
    pub meeting_link: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError>;
}
