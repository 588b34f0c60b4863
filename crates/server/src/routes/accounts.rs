//! Account lifecycle API routes.
//!
//! JSON endpoints for registration, email confirmation, login and password
//! reset. Missing fields deserialize as empty strings and are rejected by the
//! account service; bodies that are not JSON objects are 400 "Invalid request".

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::error::{Action, AppError, Result, set_sentry_user};
use crate::services::accounts::PASSWORD_RESET_REQUESTED;
use crate::state::AppState;

/// Email and password, as sent to `/register` and `/login`.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query string of `/confirm-email`.
#[derive(Debug, Deserialize)]
pub struct ConfirmEmailQuery {
    #[serde(default)]
    pub token: String,
}

/// Body of `/request-password-reset`.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub email: String,
}

/// Body of `/reset-password`.
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

/// Plain `{"message": ...}` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Response of `/register`.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub confirmation_email_sent: bool,
}

/// Response of `/login`.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Register a new account.
///
/// POST /register
///
/// Responds 201 even when the confirmation email could not be sent; the
/// `confirmation_email_sent` flag reports delivery.
///
/// # Errors
///
/// Returns 400 for a malformed body or invalid input, 500 otherwise.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;

    let registration = state
        .accounts()
        .register(&req.email, &req.password)
        .await
        .map_err(AppError::account(Action::Register))?;

    let message = if registration.confirmation_email_sent() {
        "User registered successfully. Check your email to confirm your account."
    } else {
        "User registered successfully, but the confirmation email could not be sent."
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: message.to_string(),
            confirmation_email_sent: registration.confirmation_email_sent(),
        }),
    ))
}

/// Confirm an email address.
///
/// GET /confirm-email?token=...
///
/// # Errors
///
/// Returns 400 for a missing token, 404 for an unknown token, 500 otherwise.
pub async fn confirm_email(
    State(state): State<AppState>,
    query: std::result::Result<Query<ConfirmEmailQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>> {
    let Query(query) = query?;

    state
        .accounts()
        .confirm_email(&query.token)
        .await
        .map_err(AppError::account(Action::ConfirmEmail))?;

    Ok(MessageResponse::new("Email confirmed successfully"))
}

/// Log in with email and password.
///
/// POST /login
///
/// # Errors
///
/// Returns 401 for any credential mismatch, 500 if signing or storage fails.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(req) = payload?;

    let outcome = state
        .accounts()
        .login(&req.email, &req.password)
        .await
        .map_err(AppError::account(Action::Login))?;

    set_sentry_user(&outcome.account_id);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: outcome.token,
    }))
}

/// Request a password reset link.
///
/// POST /request-password-reset
///
/// Responds with the same message whether or not the account exists.
///
/// # Errors
///
/// Returns 400 only for a malformed body.
pub async fn request_password_reset(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PasswordResetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;

    state.accounts().request_password_reset(&req.email).await;

    Ok(MessageResponse::new(PASSWORD_RESET_REQUESTED))
}

/// Set a new password with a reset token.
///
/// POST /reset-password
///
/// # Errors
///
/// Returns 400 for a malformed body or empty fields, 500 for an unknown or
/// expired token and for storage failures.
pub async fn reset_password(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;

    state
        .accounts()
        .reset_password(&req.token, &req.new_password)
        .await
        .map_err(AppError::account(Action::ResetPassword))?;

    Ok(MessageResponse::new("Password has been reset successfully"))
}
