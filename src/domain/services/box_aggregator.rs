use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;
use crate::config::SchedulerSettings;
use crate::domain::models::booking::Booking;
use crate::domain::models::booking_box::BookingBox;
use crate::domain::models::slot::Slot;
use crate::domain::ports::{BookingRepository, SlotRepository};
use crate::domain::services::box_status::project_box;
use crate::domain::services::time_slot_cache::TimeSlotCache;
use crate::error::AppError;

/// Recomputes boxes from slots and bookings on every read.
pub struct BoxAggregator {
    slots: Arc<dyn SlotRepository>,
    bookings: Arc<dyn BookingRepository>,
    time_slots: Arc<TimeSlotCache>,
    tz: Tz,
    settings: SchedulerSettings,
}

impl BoxAggregator {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        bookings: Arc<dyn BookingRepository>,
        time_slots: Arc<TimeSlotCache>,
        tz: Tz,
        settings: SchedulerSettings,
    ) -> Self {
        Self { slots, bookings, time_slots, tz, settings }
    }

    /// Boxes that still need a decision, ordered by date then start time.
    pub async fn pending_boxes(&self, now: DateTime<Utc>, include_approved: bool) -> Result<Vec<BookingBox>, AppError> {
        let mut slots = self.slots.list_with_pending().await?;
        if include_approved {
            slots.extend(self.slots.list_fully_approved().await?);
        }
        self.project_all(slots, now).await
    }

    pub async fn box_for_slot(&self, slot_id: &str, now: DateTime<Utc>) -> Result<BookingBox, AppError> {
        let slot = self.slots.find_by_id(slot_id).await?
            .ok_or(AppError::NotFound(format!("Slot {} not found", slot_id)))?;
        let time_slot = self.time_slots.get(slot.time_slot_id).await?
            .ok_or(AppError::NotFound(format!("Time slot {} not found", slot.time_slot_id)))?;
        let bookings = self.bookings.list_by_slot(&slot.id).await?;
        Ok(project_box(&slot, &time_slot, &bookings, now, &self.tz, &self.settings))
    }

    async fn project_all(&self, slots: Vec<Slot>, now: DateTime<Utc>) -> Result<Vec<BookingBox>, AppError> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = slots.iter().map(|s| s.id.clone()).collect();
        let mut by_slot: HashMap<String, Vec<Booking>> = HashMap::new();
        for booking in self.bookings.list_for_slots(&ids).await? {
            by_slot.entry(booking.slot_id.clone()).or_default().push(booking);
        }

        let mut boxes = Vec::with_capacity(slots.len());
        for slot in &slots {
            let Some(time_slot) = self.time_slots.get(slot.time_slot_id).await? else {
                warn!(slot_id = %slot.id, time_slot_id = slot.time_slot_id, "Skipping box with unknown time slot");
                continue;
            };
            let bookings = by_slot.get(&slot.id).map(Vec::as_slice).unwrap_or_default();
            boxes.push(project_box(slot, &time_slot, bookings, now, &self.tz, &self.settings));
        }

        boxes.sort_by(|a, b| {
            a.date.cmp(&b.date)
                .then(a.start_time.cmp(&b.start_time))
                .then(a.slot_id.cmp(&b.slot_id))
        });
        Ok(boxes)
    }
}
