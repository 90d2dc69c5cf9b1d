use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Slot full: {0}")]
    SlotFull(String),
    #[error("Slot closed: {0}")]
    SlotClosed(String),
    #[error("Duplicate reservation: {0}")]
    DuplicateReservation(String),
    #[error("Notification failed: {0}")]
    Notification(String),
    #[error("Meeting provider failed: {0}")]
    Meeting(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "PERSISTENCE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SlotFull(_) => "SLOT_FULL",
            AppError::SlotClosed(_) => "SLOT_CLOSED",
            AppError::DuplicateReservation(_) => "DUPLICATE_RESERVATION",
            AppError::Notification(_) => "NOTIFICATION_ERROR",
            AppError::Meeting(_) => "MEETING_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InternalWithMsg(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AppError::Database(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()))
    }

    pub fn is_check_violation(&self) -> bool {
        matches!(self, AppError::Database(e) if e.as_database_error().is_some_and(|db| db.is_check_violation()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error()
                    && db_err.is_unique_violation() {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)", "code": "CONFLICT" }))
                    ).into_response();
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::SlotFull(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::SlotClosed(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::DuplicateReservation(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Notification(msg) | AppError::Meeting(msg) => {
                error!("Collaborator error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream service failed".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
