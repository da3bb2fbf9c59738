use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, booking, dependent, health, slot};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))

        // Linked profiles
        .route("/api/v1/dependents", get(dependent::list_dependents).post(dependent::create_dependent))
        .route("/api/v1/dependents/{id}", delete(dependent::delete_dependent))

        // Public availability
        .route("/api/v1/slots", get(slot::list_availability))
        .route("/api/v1/slots/{date}/{time}", get(slot::get_availability))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_my_bookings))
        .route("/api/v1/bookings/{id}/cancel", post(booking::cancel_booking))

        // Admin
        .route("/api/v1/admin/slots", get(admin::list_slots).post(admin::create_slot))
        .route("/api/v1/admin/slots/recurring", post(admin::generate_recurring_slots))
        .route("/api/v1/admin/slots/reconcile", post(admin::reconcile_slots))
        .route("/api/v1/admin/slots/{id}", put(admin::update_slot).delete(admin::delete_slot))
        .route("/api/v1/admin/bookings", get(admin::list_bookings))
        .route("/api/v1/admin/bookings/{id}/cancel", post(admin::cancel_booking))
        .route("/api/v1/admin/stats", get(admin::stats))

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
                        user_id = tracing::field::Empty,
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
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
