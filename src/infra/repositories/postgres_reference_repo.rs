use crate::domain::{models::{contact::Contact, time_slot::TimeSlot}, ports::{ContactDirectory, TimeSlotRepository}};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

/// Read-only access to the reference tables maintained outside this service.
pub struct PostgresReferenceRepo {
    pool: PgPool,
}

impl PostgresReferenceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimeSlotRepository for PostgresReferenceRepo {
    async fn list_all(&self) -> Result<Vec<TimeSlot>, AppError> {
        sqlx::query_as::<_, TimeSlot>(
            "SELECT id, label, start_time, end_time, sort_order, is_active FROM time_slots ORDER BY sort_order ASC, start_time ASC"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}

#[async_trait]
impl ContactDirectory for PostgresReferenceRepo {
    async fn find_contact(&self, id: &str) -> Result<Option<Contact>, AppError> {
        sqlx::query_as::<_, Contact>("SELECT id, name, email, role FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
