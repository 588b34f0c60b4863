//! HTTP route handlers for the server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Accounts
//! POST /register               - Create an unconfirmed account
//! GET  /confirm-email          - Confirm with ?token=
//! POST /login                  - Exchange credentials for a bearer token
//! POST /request-password-reset - Email a reset link if the account exists
//! POST /reset-password         - Set a new password with a reset token
//!
//! # Barbers
//! GET  /barbers                - All barbers
//! GET  /filtered-barbers       - Filtered, sorted, paginated barbers
//! ```
//!
//! Every route, health checks included, sits behind the admission gate.

pub mod accounts;
pub mod barbers;
pub mod health;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{admission_middleware, request_id_middleware};
use crate::state::AppState;

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/confirm-email", get(accounts::confirm_email))
        .route("/login", post(accounts::login))
        .route("/request-password-reset", post(accounts::request_password_reset))
        .route("/reset-password", post(accounts::reset_password))
}

/// Create the barber listing routes router.
pub fn barber_routes() -> Router<AppState> {
    Router::new()
        .route("/barbers", get(barbers::index))
        .route("/filtered-barbers", get(barbers::filtered))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(account_routes())
        .merge(barber_routes())
        .fallback(not_found)
}

/// Build the full application: routes, request tracing and the admission gate.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let gate = state.gate().clone();

    routes()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(middleware::from_fn_with_state(gate, admission_middleware))
        .with_state(state)
}

/// Span for one request. Records the path only: query strings carry
/// confirmation tokens and must stay out of logs.
fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = tracing::field::Empty,
    )
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
