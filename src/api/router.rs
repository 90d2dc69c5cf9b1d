use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, booking, slot, boxes};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Reference data
        .route("/api/v1/time-slots", get(slot::list_time_slots))

        // Slots
        .route("/api/v1/slots", post(slot::create_slot))
        .route("/api/v1/slots/{slot_id}", get(slot::get_slot))
        .route("/api/v1/teachers/{teacher_id}/slots", get(slot::list_teacher_slots))

        // Booking Flow
        .route("/api/v1/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))

        // Admin Boxes
        .route("/api/v1/admin/boxes/pending", get(boxes::list_pending_boxes))
        .route("/api/v1/admin/boxes/auto-close", post(boxes::auto_close))
        .route("/api/v1/admin/boxes/auto-approve", post(boxes::auto_approve))
        .route("/api/v1/admin/boxes/{slot_id}", get(boxes::get_box))
        .route("/api/v1/admin/boxes/{slot_id}/approve", post(boxes::approve_box))
        .route("/api/v1/admin/boxes/{slot_id}/close", post(boxes::close_box))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        admin_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
