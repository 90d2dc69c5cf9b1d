use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use crate::domain::models::booking::Booking;
use crate::domain::models::slot::Slot;
use crate::domain::ports::{
    BookingRepository, ContactDirectory, MeetingRef, Notification, Notifier, RecipientRole, SlotRepository,
};
use crate::domain::services::meeting_link::validate_link;
use crate::domain::services::time_slot_cache::TimeSlotCache;
use crate::error::AppError;

/// Approver id recorded on bookings approved by the reconciliation task.
pub const AUTO_APPROVER: &str = "AUTO_SYSTEM";

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ApprovalOutcome {
    /// Bookings this call moved from pending to approved.
    pub approved: u32,
    /// Bookings whose notification could not be delivered.
    pub failed: u32,
    pub notified: u32,
}

impl ApprovalOutcome {
    pub fn absorb(&mut self, other: ApprovalOutcome) {
        self.approved += other.approved;
        self.failed += other.failed;
        self.notified += other.notified;
    }
}

pub struct ApprovalService {
    slots: Arc<dyn SlotRepository>,
    bookings: Arc<dyn BookingRepository>,
    contacts: Arc<dyn ContactDirectory>,
    notifier: Arc<dyn Notifier>,
    time_slots: Arc<TimeSlotCache>,
}

impl ApprovalService {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        bookings: Arc<dyn BookingRepository>,
        contacts: Arc<dyn ContactDirectory>,
        notifier: Arc<dyn Notifier>,
        time_slots: Arc<TimeSlotCache>,
    ) -> Self {
        Self { slots, bookings, contacts, notifier, time_slots }
    }

    /// Approves every settled pending booking of the slot as one transaction,
    /// then notifies per booking.
    ///
    /// Without an explicit link the slot's existing meeting is reused, so
    /// students added after a first approval join the same room. Notification
    /// failures are counted and never undo the approval.
    pub async fn approve_box(
        &self,
        slot_id: &str,
        approver_id: &str,
        meeting: Option<MeetingRef>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, AppError> {
        let slot = self.slots.find_by_id(slot_id).await?
            .ok_or(AppError::NotFound(format!("Slot {} not found", slot_id)))?;

        if let Some(m) = &meeting {
            validate_link(&m.link)?;
        }
        let explicit_link = meeting.is_some();
        let meeting = match meeting {
            Some(m) => Some(m),
            None => self.bookings.find_slot_meeting(slot_id).await?,
        };

        let claimed = self.bookings.approve_pending(slot_id, approver_id, meeting.as_ref(), now).await?;
        let mut outcome = ApprovalOutcome { approved: claimed.len() as u32, ..Default::default() };

        let mut to_notify = claimed;
        if explicit_link && let Some(m) = &meeting {
            // Earlier approvals made without a link pick it up now.
            to_notify.extend(self.bookings.attach_missing_meeting(slot_id, m).await?);
        }

        if outcome.approved > 0 {
            info!(slot_id = %slot_id, approver = %approver_id, approved = outcome.approved, "Box approved");
        }

        let (notified, failed) = self.notify_all(&slot, &to_notify).await;
        outcome.notified = notified;
        outcome.failed = failed;
        Ok(outcome)
    }

    /// Manual close. Existing bookings stay as they are.
    pub async fn close_box(&self, slot_id: &str) -> Result<Slot, AppError> {
        let slot = self.slots.close(slot_id).await?;
        info!(slot_id = %slot_id, "Box closed");
        Ok(slot)
    }

    /// Re-sends notifications for approved bookings whose guard flags never
    /// flipped, e.g. after a crash between the approval commit and delivery.
    pub async fn resend_pending_notifications(&self, limit: i32) -> Result<ApprovalOutcome, AppError> {
        let stale = self.bookings.list_unnotified_approved(limit).await?;
        let mut by_slot: HashMap<String, Vec<Booking>> = HashMap::new();
        for booking in stale {
            by_slot.entry(booking.slot_id.clone()).or_default().push(booking);
        }

        let mut outcome = ApprovalOutcome::default();
        for (slot_id, bookings) in by_slot {
            let Some(slot) = self.slots.find_by_id(&slot_id).await? else {
                warn!(slot_id = %slot_id, "Approved bookings reference a missing slot");
                outcome.failed += bookings.len() as u32;
                for booking in &bookings {
                    self.bookings.record_notify_failure(&booking.id).await?;
                }
                continue;
            };
            let (notified, failed) = self.notify_all(&slot, &bookings).await;
            outcome.notified += notified;
            outcome.failed += failed;
        }
        Ok(outcome)
    }

    async fn notify_all(&self, slot: &Slot, bookings: &[Booking]) -> (u32, u32) {
        let pending: Vec<&Booking> = bookings.iter().filter(|b| b.needs_notification()).collect();
        if pending.is_empty() {
            return (0, 0);
        }

        let time_label = match self.time_slots.get(slot.time_slot_id).await {
            Ok(Some(ts)) => ts.label,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(slot_id = %slot.id, error = %e, "Time slot lookup failed, notifying without label");
                String::new()
            }
        };

        let (mut notified, mut failed) = (0, 0);
        for booking in pending {
            match self.notify_booking(slot, &time_label, booking).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    failed += 1;
                    warn!(booking_id = %booking.id, slot_id = %slot.id, error = %e, "Approval notification failed");
                    if let Err(e) = self.bookings.record_notify_failure(&booking.id).await {
                        warn!(booking_id = %booking.id, error = %e, "Could not record notification failure");
                    }
                }
            }
        }
        (notified, failed)
    }

    async fn notify_booking(&self, slot: &Slot, time_label: &str, booking: &Booking) -> Result<(), AppError> {
        let Some(link) = booking.meeting_link.clone() else {
            return Ok(());
        };

        let student = self.contacts.find_contact(&booking.student_id).await?
            .ok_or_else(|| AppError::Notification(format!("No contact for student {}", booking.student_id)))?;
        let teacher = self.contacts.find_contact(&booking.teacher_id).await?
            .ok_or_else(|| AppError::Notification(format!("No contact for teacher {}", booking.teacher_id)))?;

        for (contact, role) in [(student, RecipientRole::Student), (teacher, RecipientRole::Teacher)] {
            let notification = Notification {
                recipient_email: contact.email,
                recipient_name: contact.name,
                role,
                booking_id: booking.id.clone(),
                slot_date: slot.date,
                time_label: time_label.to_string(),
                topic: slot.topic.clone(),
                meeting_link: link.clone(),
            };
            self.notifier.notify(&notification).await.map_err(|e| match e {
                AppError::Notification(msg) => AppError::Notification(msg),
                other => AppError::Notification(other.to_string()),
            })?;
        }

        self.bookings.mark_notified(&booking.id).await?;
        Ok(())
    }
}
