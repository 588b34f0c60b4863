//! Account lifecycle service.
//!
//! Orchestrates registration, email confirmation, login and password reset
//! over an [`AccountStore`] and an [`EmailGateway`]. Email is always sent
//! after the store call has returned, never inside a storage transaction.
//!
//! ```text
//! register ──► Unconfirmed ──confirm_email──► Confirmed
//!                   │                             │
//!                   └──request_password_reset─────┴──► ResetPending
//!                                                        │
//!                      reset_password (before expiry) ◄──┘
//! ```

mod error;

pub use error::AccountError;

use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use barberbook_core::{AccountId, Email};

use crate::db::{AccountStore, StoreError};
use crate::services::email::{EmailGateway, TransportError};
use crate::services::password::CredentialHasher;
use crate::services::token::TokenIssuer;

/// Response text for every password reset request, whether or not the
/// account exists.
pub const PASSWORD_RESET_REQUESTED: &str =
    "If your email address is in our database, you will receive a password reset email shortly";

const CONFIRMATION_SUBJECT: &str = "Confirm Your Account";
const PASSWORD_RESET_SUBJECT: &str = "Password Reset";

/// Settings that shape account emails and token lifetimes.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    /// Public origin used to build links, without a trailing slash.
    pub base_url: String,
    /// How long a password reset token stays valid.
    pub reset_token_ttl: TimeDelta,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            reset_token_ttl: TimeDelta::hours(24),
        }
    }
}

/// Result of a successful registration.
#[derive(Debug)]
pub struct Registration {
    pub email: Email,
    /// Outcome of sending the confirmation email.
    pub delivery: Result<(), TransportError>,
}

impl Registration {
    #[must_use]
    pub const fn confirmation_email_sent(&self) -> bool {
        self.delivery.is_ok()
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account_id: AccountId,
    /// Signed bearer token.
    pub token: String,
}

/// Account lifecycle operations.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn EmailGateway>,
    hasher: CredentialHasher,
    tokens: TokenIssuer,
    settings: AccountSettings,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn EmailGateway>,
        hasher: CredentialHasher,
        tokens: TokenIssuer,
        settings: AccountSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            hasher,
            tokens,
            settings,
        }
    }

    /// The token issuer used by `login`.
    #[must_use]
    pub const fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new unconfirmed account and send its confirmation link.
    ///
    /// A failed email delivery does not undo the registration; it is
    /// reported through [`Registration::delivery`].
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for an empty or malformed email or
    /// an empty password, `AccountError::DuplicateEmail` if the email is
    /// taken, and `Hashing`/`Persistence` for internal failures.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<Registration, AccountError> {
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let email = Email::parse(email).map_err(|e| AccountError::Validation(e.to_string()))?;
        let password_hash = self.hasher.hash(password)?;

        let confirmation_token = self.store.create_account(&email, &password_hash).await?;

        tracing::info!(email = %email, "Account registered");

        let body = format!(
            "Confirm your account by visiting: {}/confirm-email?token={confirmation_token}",
            self.settings.base_url
        );
        let delivery = self.mailer.send(&email, CONFIRMATION_SUBJECT, &body).await;

        if let Err(e) = &delivery {
            tracing::warn!(email = %email, error = %e, "Failed to send confirmation email");
        }

        Ok(Registration { email, delivery })
    }

    /// Confirm the account holding `token`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for an empty token and
    /// `AccountError::TokenNotFound` if no account holds it.
    pub async fn confirm_email(&self, token: &str) -> Result<(), AccountError> {
        if token.is_empty() {
            return Err(AccountError::Validation("token is required".to_string()));
        }

        self.store.confirm_email(token).await?;

        tracing::info!("Email confirmed");
        Ok(())
    }

    /// Check credentials and issue a bearer token.
    ///
    /// Unconfirmed accounts may log in.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Authentication` for an unknown email, a
    /// malformed email or a wrong password, without distinguishing them.
    /// Each of these runs exactly one password verification.
    /// Returns `AccountError::Signing` if the token cannot be signed.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AccountError> {
        let Ok(email) = Email::parse(email) else {
            self.hasher.verify_decoy(password);
            return Err(AccountError::Authentication);
        };

        let Some(account) = self.store.get_account_by_email(&email).await? else {
            self.hasher.verify_decoy(password);
            return Err(AccountError::Authentication);
        };

        if !self.hasher.verify(&account.password_hash, password) {
            return Err(AccountError::Authentication);
        }

        let token = self.tokens.issue(account.id, &account.email)?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(LoginOutcome {
            account_id: account.id,
            token,
        })
    }

    /// Start a password reset for `email` if such an account exists.
    ///
    /// Never fails and never reveals whether the account exists; callers
    /// always answer with [`PASSWORD_RESET_REQUESTED`]. Failures are logged.
    #[tracing::instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) {
        let Ok(email) = Email::parse(email) else {
            return;
        };

        match self.store.get_account_by_email(&email).await {
            Ok(Some(_)) => {}
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "Failed to look up account for password reset");
                return;
            }
        }

        let expires_at = Utc::now() + self.settings.reset_token_ttl;
        let reset_token = match self.store.create_password_reset_token(&email, expires_at).await {
            Ok(token) => token,
            // Deleted between lookup and update
            Err(StoreError::NotFound) => return,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create password reset token");
                return;
            }
        };

        let body = format!(
            "Click here to reset your password: {}/reset-password?token={reset_token}",
            self.settings.base_url
        );
        if let Err(e) = self.mailer.send(&email, PASSWORD_RESET_SUBJECT, &body).await {
            tracing::warn!(email = %email, error = %e, "Failed to send password reset email");
        }
    }

    /// Set a new password using an unexpired reset token.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for an empty token or password and
    /// `AccountError::TokenNotFound` if the token is unknown, used or expired.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError> {
        if token.is_empty() || new_password.is_empty() {
            return Err(AccountError::Validation(
                "token and new password are required".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .reset_password(token, &password_hash, Utc::now())
            .await?;

        tracing::info!("Password reset");
        Ok(())
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("tokens", &self.tokens)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryAccountStore;
    use crate::services::email::RecordingEmailGateway;

    struct Harness {
        service: AccountService,
        store: Arc<MemoryAccountStore>,
        mailer: Arc<RecordingEmailGateway>,
        hasher: CredentialHasher,
    }

    fn harness_with(settings: AccountSettings) -> Harness {
        let store = Arc::new(MemoryAccountStore::new());
        let mailer = Arc::new(RecordingEmailGateway::new());
        let hasher = CredentialHasher::insecure_fast();
        let tokens = TokenIssuer::new(&SecretString::from("unit-test-signing-key".to_string()), None);
        let service = AccountService::new(
            store.clone(),
            mailer.clone(),
            hasher.clone(),
            tokens,
            settings,
        );
        Harness {
            service,
            store,
            mailer,
            hasher,
        }
    }

    fn harness() -> Harness {
        harness_with(AccountSettings::default())
    }

    #[tokio::test]
    async fn test_register_sends_confirmation_link() {
        let h = harness();
        let registration = h.service.register("a@x.com", "pw1").await.unwrap();
        assert!(registration.confirmation_email_sent());

        let mail = h.mailer.last().unwrap();
        assert_eq!(mail.to, "a@x.com");
        assert_eq!(mail.subject, CONFIRMATION_SUBJECT);
        assert!(mail.body.contains("http://localhost:8080/confirm-email?token="));

        let account = h.store.account("a@x.com").await.unwrap();
        assert!(!account.email_confirmed);
        assert_eq!(mail.token(), account.confirmation_token.as_deref());
        assert!(!account.password_hash.contains("pw1"));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_and_malformed_input() {
        let h = harness();
        for (email, password) in [("", "pw"), ("a@x.com", ""), ("not-an-email", "pw")] {
            let err = h.service.register(email, password).await.unwrap_err();
            assert!(matches!(err, AccountError::Validation(_)), "{email:?}");
        }
        assert_eq!(h.store.count_accounts().await.unwrap(), 0);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let h = harness();
        h.service.register("a@x.com", "pw1").await.unwrap();

        let err = h.service.register("a@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AccountError::DuplicateEmail));
        assert_eq!(h.store.count_accounts().await.unwrap(), 1);
        assert_eq!(h.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_register_survives_failed_delivery() {
        let h = harness();
        h.mailer.fail_sends(true);

        let registration = h.service.register("a@x.com", "pw1").await.unwrap();
        assert!(!registration.confirmation_email_sent());
        assert!(h.store.account("a@x.com").await.is_some());
    }

    #[tokio::test]
    async fn test_login_without_confirmation() {
        let h = harness();
        h.service.register("a@x.com", "pw1").await.unwrap();

        let outcome = h.service.login("a@x.com", "pw1").await.unwrap();
        let claims = h.service.tokens().verify(&outcome.token).unwrap();
        assert_eq!(claims.sub, outcome.account_id);
        assert_eq!(claims.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_every_login_failure_runs_one_verification() {
        let h = harness();
        h.service.register("a@x.com", "pw1").await.unwrap();

        for (email, password) in [
            ("a@x.com", "nope"),
            ("ghost@x.com", "pw1"),
            ("not-an-email", "pw1"),
        ] {
            let before = h.hasher.verifications();
            assert!(matches!(
                h.service.login(email, password).await,
                Err(AccountError::Authentication)
            ));
            assert_eq!(h.hasher.verifications(), before + 1, "{email}");
        }
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness();
        h.service.register("a@x.com", "pw1").await.unwrap();

        let wrong_password = h.service.login("a@x.com", "pw2").await.unwrap_err();
        let unknown = h.service.login("b@x.com", "pw1").await.unwrap_err();
        let malformed = h.service.login("nope", "pw1").await.unwrap_err();

        assert!(matches!(wrong_password, AccountError::Authentication));
        assert!(matches!(unknown, AccountError::Authentication));
        assert!(matches!(malformed, AccountError::Authentication));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_confirm_email_is_single_use() {
        let h = harness();
        h.service.register("a@x.com", "pw1").await.unwrap();
        let token = h.mailer.last().unwrap().token().unwrap().to_owned();

        h.service.confirm_email(&token).await.unwrap();
        assert!(h.store.account("a@x.com").await.unwrap().email_confirmed);

        let err = h.service.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AccountError::TokenNotFound));

        let err = h.service.confirm_email("").await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_request_for_unknown_email_is_silent() {
        let h = harness();
        h.service.request_password_reset("ghost@x.com").await;
        h.service.request_password_reset("not-an-email").await;

        assert!(h.mailer.sent().is_empty());
        assert_eq!(h.store.count_accounts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let h = harness();
        h.service.register("a@x.com", "old-pw").await.unwrap();

        h.service.request_password_reset("a@x.com").await;
        let mail = h.mailer.last().unwrap();
        assert_eq!(mail.subject, PASSWORD_RESET_SUBJECT);
        assert!(mail.body.contains("/reset-password?token="));
        let token = mail.token().unwrap().to_owned();

        let account = h.store.account("a@x.com").await.unwrap();
        assert_eq!(account.reset_token.as_deref(), Some(token.as_str()));

        h.service.reset_password(&token, "new-pw").await.unwrap();
        assert!(h.service.login("a@x.com", "new-pw").await.is_ok());
        assert!(matches!(
            h.service.login("a@x.com", "old-pw").await,
            Err(AccountError::Authentication)
        ));

        let reused = h.service.reset_password(&token, "third-pw").await.unwrap_err();
        assert!(matches!(reused, AccountError::TokenNotFound));
    }

    #[tokio::test]
    async fn test_expired_reset_token_keeps_old_password() {
        let h = harness_with(AccountSettings {
            reset_token_ttl: TimeDelta::seconds(-1),
            ..AccountSettings::default()
        });
        h.service.register("a@x.com", "old-pw").await.unwrap();
        let before = h.store.account("a@x.com").await.unwrap().password_hash;

        h.service.request_password_reset("a@x.com").await;
        let token = h.mailer.last().unwrap().token().unwrap().to_owned();

        let err = h.service.reset_password(&token, "new-pw").await.unwrap_err();
        assert!(matches!(err, AccountError::TokenNotFound));
        assert_eq!(h.store.account("a@x.com").await.unwrap().password_hash, before);
        assert!(h.service.login("a@x.com", "old-pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_requires_fields() {
        let h = harness();
        assert!(matches!(
            h.service.reset_password("", "pw").await,
            Err(AccountError::Validation(_))
        ));
        assert!(matches!(
            h.service.reset_password("token", "").await,
            Err(AccountError::Validation(_))
        ));
    }
}
