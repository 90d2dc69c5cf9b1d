use axum::http::{header, request::Parts};
use axum::extract::FromRequestParts;
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;
use tracing::Span;

const ADMIN_ID_HEADER: &str = "X-Admin-Id";
const DEFAULT_ADMIN_ID: &str = "admin";

/// Operator calling the box endpoints. The id ends up in `approved_by`.
pub struct AdminUser {
    pub id: String,
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        if token.trim() != state.config.admin_api_key {
            return Err(AppError::Forbidden("Invalid admin key".into()));
        }

        let id = parts.headers.get(ADMIN_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_ADMIN_ID)
            .to_string();

        Span::current().record("admin_id", id.as_str());
        Ok(AdminUser { id })
    }
}
