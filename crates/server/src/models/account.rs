//! Account domain type.

use chrono::{DateTime, Utc};

use barberbook_core::{AccountId, Email};

/// A registered account.
///
/// Implements `Debug` manually so the password hash and outstanding tokens
/// never reach a log line.
#[derive(Clone)]
pub struct Account {
    /// Unique account ID, assigned by the store.
    pub id: AccountId,
    /// Email address, unique and case-sensitive as stored.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Whether the confirmation link has been followed.
    pub email_confirmed: bool,
    /// Present until the email is confirmed.
    pub confirmation_token: Option<String>,
    /// Present while a password reset is pending.
    pub reset_token: Option<String>,
    /// Set together with `reset_token`.
    pub reset_token_expiry: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if a reset token is present and unexpired at `now`.
    #[must_use]
    pub fn has_pending_reset(&self, now: DateTime<Utc>) -> bool {
        self.reset_token.is_some() && self.reset_token_expiry.is_some_and(|expiry| now < expiry)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("email_confirmed", &self.email_confirmed)
            .field("confirmation_pending", &self.confirmation_token.is_some())
            .field("reset_token_expiry", &self.reset_token_expiry)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
