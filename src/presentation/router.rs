// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Compression is handled in the response builders, so no CompressionLayer here
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/sign-up", post(handlers::sign_up))
        .route("/auth/oauth", post(handlers::sign_in_with_oauth))
        .route("/auth/password-reset", post(handlers::request_password_reset))
        .route("/auth/password-reset/confirm", post(handlers::confirm_password_reset))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route("/dashboard", get(handlers::dashboard))
        .route("/dashboard/stream", get(handlers::stream_dashboard))
        .route("/notice", delete(handlers::dismiss_notice))
        .route("/counter/increment", post(handlers::increment_counter))
        .route("/counter/decrement", post(handlers::decrement_counter))
        .route("/counter/reset", post(handlers::reset_counter))
        .route("/timer", get(handlers::timer))
        .route("/timer/start", post(handlers::start_timer))
        .route("/timer/stop", post(handlers::stop_timer))
        .route("/timer/reset", post(handlers::reset_timer))
        .route("/records", get(handlers::list_records).post(handlers::add_record))
        .route("/statistics", get(handlers::statistics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
