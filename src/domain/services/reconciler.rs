use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use crate::config::SchedulerSettings;
use crate::domain::models::slot::Slot;
use crate::domain::models::time_slot::TimeSlot;
use crate::domain::ports::{BookingRepository, ContactDirectory, MeetingRequest, SlotRepository};
use crate::domain::services::approval::{ApprovalOutcome, ApprovalService, AUTO_APPROVER};
use crate::domain::services::local_time::{local_date, local_to_utc};
use crate::domain::services::meeting_link::MeetingLinkResolver;
use crate::domain::services::time_slot_cache::TimeSlotCache;
use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoApprovalReport {
    pub boxes_due: u32,
    pub boxes_approved: u32,
    pub approved: u32,
    pub failed: u32,
    pub notified: u32,
    pub fallback_links: u32,
    pub errors: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub closed: u64,
    pub auto_approval: AutoApprovalReport,
    pub resent: ApprovalOutcome,
    pub errors: Vec<String>,
}

/// Periodic passes over slots and bookings.
///
/// Every pass selects its work by current row state, so running two ticks
/// at once, or a tick next to a manual approval, converges instead of
/// doubling side effects.
pub struct Reconciler {
    slots: Arc<dyn SlotRepository>,
    bookings: Arc<dyn BookingRepository>,
    contacts: Arc<dyn ContactDirectory>,
    approvals: Arc<ApprovalService>,
    time_slots: Arc<TimeSlotCache>,
    meetings: MeetingLinkResolver,
    tz: Tz,
    settings: SchedulerSettings,
}

impl Reconciler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        bookings: Arc<dyn BookingRepository>,
        contacts: Arc<dyn ContactDirectory>,
        approvals: Arc<ApprovalService>,
        time_slots: Arc<TimeSlotCache>,
        meetings: MeetingLinkResolver,
        tz: Tz,
        settings: SchedulerSettings,
    ) -> Self {
        Self { slots, bookings, contacts, approvals, time_slots, meetings, tz, settings }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub async fn auto_close(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let closed = self.slots.close_expired(now).await?;
        if closed > 0 {
            info!(closed, "Closed slots past their booking deadline");
        }
        Ok(closed)
    }

    /// True when `start` lies in `[now - grace, now + lookahead]`.
    pub fn is_due(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        start <= now + self.settings.lookahead() && start >= now - self.settings.grace()
    }

    pub async fn auto_approve(&self, now: DateTime<Utc>) -> Result<AutoApprovalReport, AppError> {
        let mut report = AutoApprovalReport::default();
        let first_day = local_date(&self.tz, now - self.settings.grace());
        let last_day = local_date(&self.tz, now + self.settings.lookahead());

        for slot in self.slots.list_with_pending().await? {
            if slot.date < first_day || slot.date > last_day {
                continue;
            }
            let time_slot = match self.time_slots.get(slot.time_slot_id).await? {
                Some(ts) => ts,
                None => {
                    warn!(slot_id = %slot.id, time_slot_id = slot.time_slot_id, "Pending box has unknown time slot");
                    continue;
                }
            };
            let Some(start) = local_to_utc(&self.tz, slot.date, time_slot.start_time) else {
                continue;
            };
            if !self.is_due(start, now) {
                continue;
            }
            report.boxes_due += 1;

            let span = info_span!("box_auto_approval", slot_id = %slot.id, teacher_id = %slot.teacher_id);
            match self.approve_due_box(&slot, &time_slot, start, now).instrument(span).await {
                Ok((outcome, fallback)) => {
                    if outcome.approved > 0 {
                        report.boxes_approved += 1;
                    }
                    if fallback {
                        report.fallback_links += 1;
                    }
                    report.approved += outcome.approved;
                    report.failed += outcome.failed;
                    report.notified += outcome.notified;
                }
                Err(e) => {
                    report.errors += 1;
                    error!(slot_id = %slot.id, error = %e, "Auto-approval failed for box");
                }
            }
        }

        if report.boxes_due > 0 {
            info!(
                boxes_due = report.boxes_due,
                approved = report.approved,
                failed = report.failed,
                fallback_links = report.fallback_links,
                "Auto-approval pass finished"
            );
        }
        Ok(report)
    }

    async fn approve_due_box(
        &self,
        slot: &Slot,
        time_slot: &TimeSlot,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(ApprovalOutcome, bool), AppError> {
        let (meeting, fallback) = match self.bookings.find_slot_meeting(&slot.id).await? {
            Some(existing) => (existing, false),
            None => {
                let request = self.meeting_request(slot, time_slot, start).await?;
                let resolved = self.meetings.resolve(&request).await;
                (resolved.meeting, resolved.fallback)
            }
        };

        let outcome = self.approvals.approve_box(&slot.id, AUTO_APPROVER, Some(meeting), now).await?;
        Ok((outcome, fallback))
    }

    async fn meeting_request(&self, slot: &Slot, time_slot: &TimeSlot, start: DateTime<Utc>) -> Result<MeetingRequest, AppError> {
        let end = local_to_utc(&self.tz, slot.date, time_slot.end_time)
            .filter(|end| *end > start)
            .unwrap_or(start + Duration::hours(1));

        let mut attendees = Vec::new();
        if let Some(teacher) = self.contacts.find_contact(&slot.teacher_id).await? {
            attendees.push(teacher.email);
        }
        for booking in self.bookings.list_by_slot(&slot.id).await? {
            if !booking.is_pending_approval() && !booking.is_approved() {
                continue;
            }
            if let Some(student) = self.contacts.find_contact(&booking.student_id).await? {
                attendees.push(student.email);
            }
        }
        attendees.sort();
        attendees.dedup();

        Ok(MeetingRequest {
            title: slot.topic.clone().unwrap_or_else(|| format!("Session {}", time_slot.label)),
            description: slot.description.clone(),
            start,
            end,
            attendees,
        })
    }

    pub async fn resend_notifications(&self) -> Result<ApprovalOutcome, AppError> {
        self.approvals.resend_pending_notifications(self.settings.notification_batch).await
    }

    /// One reconciliation round. Passes are independent: a failing pass is
    /// logged and recorded, the others still run.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        match self.auto_close(now).await {
            Ok(closed) => report.closed = closed,
            Err(e) => {
                error!(pass = "auto_close", error = %e, "Reconciliation pass failed");
                report.errors.push(format!("auto_close: {}", e));
            }
        }

        match self.auto_approve(now).await {
            Ok(auto) => report.auto_approval = auto,
            Err(e) => {
                error!(pass = "auto_approve", error = %e, "Reconciliation pass failed");
                report.errors.push(format!("auto_approve: {}", e));
            }
        }

        match self.resend_notifications().await {
            Ok(resent) => report.resent = resent,
            Err(e) => {
                error!(pass = "resend_notifications", error = %e, "Reconciliation pass failed");
                report.errors.push(format!("resend_notifications: {}", e));
            }
        }

        report
    }
}

