use crate::domain::{models::slot::Slot, ports::SlotRepository};
use crate::error::AppError;
use crate::infra::repositories::slot_create_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, NaiveDate, Utc};

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn create(&self, slot: &Slot) -> Result<Slot, AppError> {
        sqlx::query_as::<_, Slot>(
            "INSERT INTO slots (id, teacher_id, date, time_slot_id, max_capacity, current_bookings, is_unlimited, booking_deadline, is_available, topic, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&slot.id).bind(&slot.teacher_id).bind(slot.date).bind(slot.time_slot_id)
            .bind(slot.max_capacity).bind(slot.current_bookings).bind(slot.is_unlimited).bind(slot.booking_deadline)
            .bind(slot.is_available).bind(&slot.topic).bind(&slot.description).bind(slot.created_at).bind(slot.updated_at)
            .fetch_one(&self.pool).await.map_err(slot_create_error)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_by_teacher(&self, teacher_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>("SELECT * FROM slots WHERE teacher_id = ? AND date >= ? AND date <= ? ORDER BY date ASC, time_slot_id ASC")
            .bind(teacher_id).bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_with_pending(&self) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>(
            "SELECT s.* FROM slots s
             WHERE EXISTS (
                SELECT 1 FROM bookings b WHERE b.slot_id = s.id
                AND b.payment_status IN ('paid', 'free') AND b.approval_status = 'pending' AND b.status = 'paid'
             )
             ORDER BY s.date ASC, s.time_slot_id ASC"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_fully_approved(&self) -> Result<Vec<Slot>, AppError> {
        sqlx::query_as::<_, Slot>(
            "SELECT s.* FROM slots s
             WHERE EXISTS (SELECT 1 FROM bookings b WHERE b.slot_id = s.id AND b.approval_status = 'approved' AND b.status <> 'cancelled')
             AND NOT EXISTS (
                SELECT 1 FROM bookings b WHERE b.slot_id = s.id
                AND b.payment_status IN ('paid', 'free') AND b.approval_status = 'pending' AND b.status = 'paid'
             )
             ORDER BY s.date ASC, s.time_slot_id ASC"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn close(&self, id: &str) -> Result<Slot, AppError> {
        sqlx::query_as::<_, Slot>("UPDATE slots SET is_available = FALSE, updated_at = ? WHERE id = ? RETURNING *")
            .bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound(format!("Slot {} not found", id)))
    }
    async fn close_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots SET is_available = FALSE, updated_at = ?
             WHERE is_available = TRUE AND booking_deadline IS NOT NULL AND booking_deadline < ?"
        )
            .bind(now).bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
