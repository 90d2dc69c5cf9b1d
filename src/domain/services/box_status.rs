use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use crate::config::SchedulerSettings;
use crate::domain::models::booking::Booking;
use crate::domain::models::booking_box::{BookingBox, BoxEntry, BoxStatus};
use crate::domain::models::slot::{deadline_passed, Slot};
use crate::domain::models::time_slot::TimeSlot;
use crate::domain::services::local_time::{hours_until, local_to_utc, minutes_until};

/// Everything the status of a box depends on.
#[derive(Debug, Clone)]
pub struct BoxInputs {
    pub now: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub seats_taken: i32,
    pub max_capacity: i32,
    pub is_unlimited: bool,
    pub pending: usize,
    pub approved: usize,
    pub deadline_warning: Duration,
}

/// First match wins: APPROVED, CLOSED, PARTIAL, OPEN.
///
/// A box whose pending list emptied because every entry was approved reports
/// APPROVED rather than falling through to OPEN. Exhaustion (deadline or
/// capacity) is checked before "has bookings" so a full box is never shown
/// as bookable.
pub fn derive_status(inputs: &BoxInputs) -> BoxStatus {
    if inputs.pending == 0 && inputs.approved > 0 {
        return BoxStatus::Approved;
    }

    let at_capacity = !inputs.is_unlimited && inputs.seats_taken >= inputs.max_capacity;
    if deadline_passed(inputs.deadline, inputs.now) || at_capacity {
        return BoxStatus::Closed;
    }

    let deadline_near = inputs.deadline.is_some_and(|d| d - inputs.now < inputs.deadline_warning);
    if deadline_near || inputs.seats_taken > 0 {
        return BoxStatus::Partial;
    }

    BoxStatus::Open
}

/// Builds the box for one slot from all of its bookings.
pub fn project_box(
    slot: &Slot,
    time_slot: &TimeSlot,
    bookings: &[Booking],
    now: DateTime<Utc>,
    tz: &Tz,
    settings: &SchedulerSettings,
) -> BookingBox {
    let mut pending: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.slot_id == slot.id && b.is_pending_approval())
        .collect();
    pending.sort_by_key(|b| b.created_at);

    let approved: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.slot_id == slot.id && b.is_approved())
        .collect();

    let status = derive_status(&BoxInputs {
        now,
        deadline: slot.booking_deadline,
        seats_taken: slot.current_bookings,
        max_capacity: slot.max_capacity,
        is_unlimited: slot.is_unlimited,
        pending: pending.len(),
        approved: approved.len(),
        deadline_warning: settings.deadline_warning(),
    });

    let meeting_start = local_to_utc(tz, slot.date, time_slot.start_time);

    BookingBox {
        slot_id: slot.id.clone(),
        teacher_id: slot.teacher_id.clone(),
        date: slot.date,
        time_slot_id: slot.time_slot_id,
        time_label: time_slot.label.clone(),
        start_time: time_slot.start_time,
        end_time: time_slot.end_time,
        topic: slot.topic.clone(),
        max_capacity: slot.max_capacity,
        is_unlimited: slot.is_unlimited,
        is_available: slot.is_available,
        seats_taken: slot.current_bookings,
        current_bookings: pending.len() as i32,
        approved_bookings: approved.len() as i32,
        booking_deadline: slot.booking_deadline,
        status,
        meeting_start,
        minutes_until_meeting: meeting_start.map(|start| minutes_until(now, start)),
        hours_until_deadline: slot.booking_deadline.map(|d| hours_until(now, d)),
        meeting_link: approved.iter().find_map(|b| b.meeting_link.clone()),
        bookings: pending
            .into_iter()
            .map(|b| BoxEntry {
                booking_id: b.id.clone(),
                student_id: b.student_id.clone(),
                payment_status: b.payment_status.clone(),
                amount: b.amount,
                created_at: b.created_at,
            })
            .collect(),
    }
}
