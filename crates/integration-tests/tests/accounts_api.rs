//! Integration tests for the account lifecycle API.
//!
//! Every request goes through the full router (admission gate, request ID,
//! tracing, extractors, error mapping) against in-memory collaborators.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use barberbook_core::AccountId;
use barberbook_integration_tests::{TEST_BASE_URL, TestApp};
use barberbook_server::db::AccountStore;
use serde_json::json;

const RESET_MESSAGE: &str =
    "If your email address is in our database, you will receive a password reset email shortly";

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_creates_unconfirmed_account() {
    let app = TestApp::new();

    let response = app.register("a@x.com", "pw1").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["confirmation_email_sent"], true);

    let account = app.store.account("a@x.com").await.unwrap();
    assert!(!account.email_confirmed);

    let mail = app.mailer.last().unwrap();
    assert_eq!(mail.subject, "Confirm Your Account");
    assert!(mail.body.contains(&format!("{TEST_BASE_URL}/confirm-email?token=")));
}

#[tokio::test]
async fn test_register_requires_email_and_password() {
    let app = TestApp::new();

    for body in [
        json!({ "email": "", "password": "pw" }),
        json!({ "email": "a@x.com", "password": "" }),
        json!({ "password": "pw" }),
        json!({ "email": "missing-at-sign", "password": "pw" }),
    ] {
        let response = app.post_json("/register", &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response.json()["error"].is_string());
    }

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_register_malformed_body() {
    let app = TestApp::new();

    let response = app.post_raw("/register", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Invalid request" }));
}

#[tokio::test]
async fn test_register_duplicate_email_is_server_error() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;

    let response = app.register("a@x.com", "pw2").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({ "error": "Failed to create account" }));
    assert_eq!(app.store.count_accounts().await.unwrap(), 1);
}

#[tokio::test]
async fn test_register_succeeds_when_email_delivery_fails() {
    let app = TestApp::new();
    app.mailer.fail_sends(true);

    let response = app.register("a@x.com", "pw1").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["confirmation_email_sent"], false);

    // The account persists and can log in
    assert!(app.store.account("a@x.com").await.is_some());
    assert_eq!(app.login("a@x.com", "pw1").await.status, StatusCode::OK);
}

// =============================================================================
// Confirmation
// =============================================================================

#[tokio::test]
async fn test_confirm_email_once() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;
    let token = app.last_token_sent_to("a@x.com").unwrap();

    let response = app.get(&format!("/confirm-email?token={token}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Email confirmed successfully");
    assert!(app.store.account("a@x.com").await.unwrap().email_confirmed);

    let response = app.get(&format!("/confirm-email?token={token}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Invalid or expired token" }));
}

#[tokio::test]
async fn test_confirm_email_requires_token() {
    let app = TestApp::new();

    for uri in ["/confirm-email", "/confirm-email?token="] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(response.json(), json!({ "error": "Token is required" }));
    }
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_register_confirm_login_scenario() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;
    let token = app.last_token_sent_to("a@x.com").unwrap();
    app.get(&format!("/confirm-email?token={token}")).await;

    let response = app.login("a@x.com", "pw1").await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Login successful");
    let bearer = body["token"].as_str().unwrap();
    assert!(!bearer.is_empty());

    let claims = app.tokens.verify(bearer).unwrap();
    let account = app.store.account("a@x.com").await.unwrap();
    assert_eq!(claims.sub, account.id);
    assert_ne!(claims.sub, AccountId::new(0));
    assert_eq!(claims.email, "a@x.com");

    let response = app.login("a@x.com", "pw2").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_without_confirmation() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;

    assert_eq!(app.login("a@x.com", "pw1").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_byte_identical() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;

    let wrong_password = app.login("a@x.com", "nope").await;
    let unknown_email = app.login("ghost@x.com", "pw1").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(
        wrong_password.json(),
        json!({ "error": "Incorrect email or password" })
    );
}

#[tokio::test]
async fn test_login_malformed_body() {
    let app = TestApp::new();
    let response = app.post_raw("/login", "not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Password reset
// =============================================================================

#[tokio::test]
async fn test_reset_request_is_identical_for_unknown_email() {
    let app = TestApp::new();
    app.register("a@x.com", "pw1").await;
    let mails_before = app.mailer.sent().len();

    let unknown = app
        .post_json("/request-password-reset", &json!({ "email": "ghost@x.com" }))
        .await;
    assert_eq!(app.mailer.sent().len(), mails_before);

    let known = app
        .post_json("/request-password-reset", &json!({ "email": "a@x.com" }))
        .await;

    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.body, known.body);
    assert_eq!(known.json()["message"], RESET_MESSAGE);

    assert_eq!(app.mailer.sent().len(), mails_before + 1);
    let account = app.store.account("a@x.com").await.unwrap();
    assert!(account.reset_token.is_some());
    assert!(app.store.account("ghost@x.com").await.is_none());
}

#[tokio::test]
async fn test_reset_request_malformed_body() {
    let app = TestApp::new();
    let response = app.post_raw("/request-password-reset", "email=a@x.com").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = TestApp::new();
    app.register("a@x.com", "old-pw").await;
    app.post_json("/request-password-reset", &json!({ "email": "a@x.com" }))
        .await;

    let mail = app.mailer.last().unwrap();
    assert_eq!(mail.subject, "Password Reset");
    assert!(mail.body.contains(&format!("{TEST_BASE_URL}/reset-password?token=")));
    let token = mail.token().unwrap().to_owned();

    let response = app
        .post_json(
            "/reset-password",
            &json!({ "token": token, "new_password": "new-pw" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["message"], "Password has been reset successfully");

    assert_eq!(app.login("a@x.com", "new-pw").await.status, StatusCode::OK);
    assert_eq!(app.login("a@x.com", "old-pw").await.status, StatusCode::UNAUTHORIZED);

    // Single use
    let reused = app
        .post_json(
            "/reset-password",
            &json!({ "token": token, "new_password": "third-pw" }),
        )
        .await;
    assert_eq!(reused.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reused.json(), json!({ "error": "Unable to reset password" }));
}

#[tokio::test]
async fn test_reset_password_validation() {
    let app = TestApp::new();

    let response = app
        .post_json("/reset-password", &json!({ "token": "", "new_password": "pw" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_json("/reset-password", &json!({ "token": "abc" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/reset-password",
            &json!({ "token": "unknown-token", "new_password": "pw" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}
