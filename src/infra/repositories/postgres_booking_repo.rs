use crate::domain::{models::{booking::Booking, slot::Slot}, ports::{BookingRepository, MeetingRef}};
use crate::error::AppError;
use crate::infra::repositories::{rejected_reservation, reservation_error};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use chrono::{DateTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn find_active(&self, student_id: &str, slot_id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE student_id = $1 AND slot_id = $2
             AND payment_status IN ('paid', 'free') AND approval_status <> 'rejected' AND status <> 'cancelled'
             ORDER BY created_at ASC LIMIT 1"
        )
            .bind(student_id).bind(slot_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn reserve_and_insert(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // The row lock taken here serializes concurrent reservations for the slot.
        let reserved = sqlx::query(
            "UPDATE slots SET current_bookings = current_bookings + 1, updated_at = $1
             WHERE id = $2 AND is_available = TRUE
             AND (is_unlimited = TRUE OR current_bookings < max_capacity)
             AND (booking_deadline IS NULL OR booking_deadline >= $3)"
        )
            .bind(now).bind(&booking.slot_id).bind(now)
            .execute(&mut *tx).await.map_err(|e| reservation_error(e, &booking.slot_id))?;

        if reserved.rows_affected() == 0 {
            let slot = sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = $1")
                .bind(&booking.slot_id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
            tx.rollback().await.map_err(AppError::Database)?;
            return Err(rejected_reservation(slot, &booking.slot_id, now));
        }

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, student_id, slot_id, teacher_id, payment_status, approval_status, status, amount, payment_ref, meeting_link, meeting_event_id, approved_by, approved_at, student_email_sent, teacher_email_sent, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.student_id).bind(&booking.slot_id).bind(&booking.teacher_id)
            .bind(&booking.payment_status).bind(&booking.approval_status).bind(&booking.status).bind(booking.amount)
            .bind(&booking.payment_ref).bind(&booking.meeting_link).bind(&booking.meeting_event_id).bind(&booking.approved_by)
            .bind(booking.approved_at).bind(booking.student_email_sent).bind(booking.teacher_email_sent)
            .bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&mut *tx).await.map_err(|e| reservation_error(e, &booking.slot_id))?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_slot(&self, slot_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE slot_id = $1 ORDER BY created_at ASC").bind(slot_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_for_slots(&self, slot_ids: &[String]) -> Result<Vec<Booking>, AppError> {
        if slot_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE slot_id = ANY($1) ORDER BY created_at ASC")
            .bind(slot_ids).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_slot_meeting(&self, slot_id: &str) -> Result<Option<MeetingRef>, AppError> {
        let row = sqlx::query(
            "SELECT meeting_link, meeting_event_id FROM bookings
             WHERE slot_id = $1 AND approval_status = 'approved' AND meeting_link IS NOT NULL
             ORDER BY approved_at ASC LIMIT 1"
        )
            .bind(slot_id).fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.map(|r| MeetingRef { link: r.get("meeting_link"), event_id: r.get("meeting_event_id") }))
    }

    async fn approve_pending(
        &self,
        slot_id: &str,
        approver_id: &str,
        meeting: Option<&MeetingRef>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let link = meeting.map(|m| m.link.clone());
        let event_id = meeting.and_then(|m| m.event_id.clone());
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET approval_status = 'approved', status = 'approved', approved_by = $1, approved_at = $2,
                meeting_link = COALESCE($3::TEXT, meeting_link), meeting_event_id = COALESCE($4::TEXT, meeting_event_id), updated_at = $5
             WHERE slot_id = $6 AND payment_status IN ('paid', 'free') AND approval_status = 'pending' AND status = 'paid'
             RETURNING *"
        )
            .bind(approver_id).bind(now).bind(link).bind(event_id).bind(now).bind(slot_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn attach_missing_meeting(&self, slot_id: &str, meeting: &MeetingRef) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET meeting_link = $1, meeting_event_id = $2, updated_at = $3
             WHERE slot_id = $4 AND approval_status = 'approved' AND meeting_link IS NULL
             RETURNING *"
        )
            .bind(&meeting.link).bind(&meeting.event_id).bind(Utc::now()).bind(slot_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn mark_notified(&self, booking_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET student_email_sent = TRUE, teacher_email_sent = TRUE, updated_at = $1
             WHERE id = $2 AND student_email_sent = FALSE"
        )
            .bind(Utc::now()).bind(booking_id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }
    async fn record_notify_failure(&self, booking_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE bookings SET notify_attempts = notify_attempts + 1, last_notify_attempt_at = $1, updated_at = $1
             WHERE id = $2"
        )
            .bind(Utc::now()).bind(booking_id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn list_unnotified_approved(&self, limit: i32) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE approval_status = 'approved' AND status <> 'cancelled'
             AND meeting_link IS NOT NULL AND student_email_sent = FALSE
             ORDER BY notify_attempts ASC, approved_at ASC LIMIT $1"
        )
            .bind(limit).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
