use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

use crate::api::handlers::{booking, health, package, provider, service, slots, waitlist};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Providers & availability
        .route("/api/v1/providers", post(provider::create_provider))
        .route("/api/v1/providers/{provider_id}", get(provider::get_provider))
        .route("/api/v1/providers/{provider_id}/windows", post(provider::create_window))
        .route("/api/v1/providers/{provider_id}/windows/{window_id}", delete(provider::delete_window))
        .route("/api/v1/providers/{provider_id}/exceptions", post(provider::upsert_exception))
        .route("/api/v1/providers/{provider_id}/exceptions/{exception_id}", delete(provider::delete_exception))
        .route("/api/v1/providers/{provider_id}/availability", get(provider::get_availability))

        // Services
        .route("/api/v1/services", post(service::create_service).get(service::list_services))
        .route("/api/v1/services/{service_id}", get(service::get_service))

        // Slot discovery
        .route("/api/v1/providers/{provider_id}/slots", get(slots::get_slots))

        // Reservation (hold + commit)
        .route("/api/v1/providers/{provider_id}/holds", post(booking::create_hold))
        .route("/api/v1/holds/{hold_id}/commit", post(booking::commit_hold))
        .route("/api/v1/holds/{hold_id}", delete(booking::release_hold))

        // Packages
        .route("/api/v1/providers/{provider_id}/packages", post(package::reserve_package))

        // Waitlist
        .route("/api/v1/providers/{provider_id}/waitlist", post(waitlist::join_waitlist).get(waitlist::list_waitlist))
        .route("/api/v1/waitlist/{entry_id}/confirm", post(waitlist::confirm_offer))
        .route("/api/v1/waitlist/{entry_id}/cancel", post(waitlist::cancel_offer))

        // Booking lifecycle
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/providers/{provider_id}/bookings", get(booking::list_provider_bookings))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/no-show", post(booking::mark_no_show))
        .route("/api/v1/bookings/{booking_id}/advance", post(booking::advance_status))

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
                        actor_id = tracing::field::Empty,
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
