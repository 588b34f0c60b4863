//! Unified error handling with Sentry integration.
//!
//! `AppError` is the only place HTTP statuses are chosen. Server errors are
//! captured to Sentry and logged with full context; clients only ever see a
//! generic `{"error": "..."}` body.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::AccountError;

/// The account operation a request was performing.
///
/// The same domain error maps to different statuses per endpoint (a missing
/// token is 404 on confirmation but 500 on password reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    ConfirmEmail,
    Login,
    ResetPassword,
}

impl Action {
    /// Name used in the `action` log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::ConfirmEmail => "confirm_email",
            Self::Login => "login",
            Self::ResetPassword => "reset_password",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An account operation failed.
    #[error("{action} failed: {source}")]
    Account {
        action: Action,
        #[source]
        source: AccountError,
    },

    /// Database operation failed outside the account service.
    #[error("Database error: {source}")]
    Database {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// Malformed request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected by the admission gate.
    #[error("Rate limited")]
    RateLimited,
}

impl AppError {
    /// Wrap an account error with the operation it came from, for `map_err`.
    pub fn account(action: Action) -> impl FnOnce(AccountError) -> Self {
        move |source| Self::Account { action, source }
    }

    /// Wrap a store error with the name of the operation, for `map_err`.
    pub fn database(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Database { action, source }
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Account { action, source } => account_status(*action, source),
            Self::Database { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
        }
    }
}

/// Status and client-facing message for an account error on `action`.
fn account_status(action: Action, err: &AccountError) -> (StatusCode, String) {
    let (status, message) = match (action, err) {
        (Action::ConfirmEmail, AccountError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, "Token is required")
        }
        (_, AccountError::Validation(msg)) => return (StatusCode::BAD_REQUEST, capitalize(msg)),
        (Action::Register, _) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create account"),
        (Action::ConfirmEmail, AccountError::TokenNotFound) => {
            (StatusCode::NOT_FOUND, "Invalid or expired token")
        }
        (Action::ConfirmEmail, _) => (StatusCode::INTERNAL_SERVER_ERROR, "Could not confirm email"),
        (Action::Login, AccountError::Authentication) => {
            (StatusCode::UNAUTHORIZED, "Incorrect email or password")
        }
        (Action::Login, AccountError::Signing(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate token")
        }
        (Action::Login, _) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        (Action::ResetPassword, _) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Unable to reset password")
        }
    };
    (status, message.to_string())
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let action = match &self {
            Self::Account { action, .. } => action.as_str(),
            Self::Database { action, .. } => *action,
            _ => "request",
        };

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                action,
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if !matches!(self, Self::RateLimited) {
            tracing::info!(action, error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Malformed JSON body");
        Self::BadRequest("Invalid request".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Malformed query string");
        Self::BadRequest("Invalid request".to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(account_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Sentry `before_send` hook that drops query strings from request data.
///
/// Confirmation and reset tokens travel in query strings.
#[must_use]
pub fn strip_request_query(
    mut event: sentry::protocol::Event<'static>,
) -> Option<sentry::protocol::Event<'static>> {
    if let Some(request) = event.request.as_mut() {
        request.query_string = None;
        if let Some(url) = request.url.as_mut() {
            url.set_query(None);
        }
    }
    Some(event)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn account(action: Action, source: AccountError) -> AppError {
        AppError::account(action)(source)
    }

    #[tokio::test]
    async fn test_rate_limited_body() {
        let (status, body) = render(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, json!({ "error": "Too many requests" }));
    }

    #[tokio::test]
    async fn test_token_not_found_depends_on_action() {
        let (status, body) = render(account(Action::ConfirmEmail, AccountError::TokenNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invalid or expired token");

        let (status, body) = render(account(Action::ResetPassword, AccountError::TokenNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Unable to reset password");
    }

    #[tokio::test]
    async fn test_register_statuses() {
        let (status, body) = render(account(
            Action::Register,
            AccountError::Validation("email and password are required".into()),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");

        let (status, body) = render(account(Action::Register, AccountError::DuplicateEmail)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to create account");
    }

    #[tokio::test]
    async fn test_login_statuses() {
        let (status, body) = render(account(Action::Login, AccountError::Authentication)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Incorrect email or password");

        let (status, _) = render(account(
            Action::Login,
            AccountError::Persistence(StoreError::NotFound),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = render(AppError::database("fetch_barbers")(
            StoreError::DataCorruption("secret detail".into()),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_strip_request_query() {
        let event = sentry::protocol::Event {
            request: Some(sentry::protocol::Request {
                url: "http://barberbook.test/confirm-email?token=secret-token"
                    .parse()
                    .ok(),
                query_string: Some("token=secret-token".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let event = strip_request_query(event).unwrap();
        let request = event.request.unwrap();
        assert!(request.query_string.is_none());
        assert_eq!(
            request.url.unwrap().as_str(),
            "http://barberbook.test/confirm-email"
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("token is required"), "Token is required");
        assert_eq!(capitalize(""), "");
    }
}
