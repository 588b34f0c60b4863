//! Account storage.
//!
//! [`AccountStore`] is the seam between the account service and persistence.
//! Every operation that checks a condition and then writes (token match,
//! reset expiry) is a single `UPDATE ... WHERE` statement so that concurrent
//! callers cannot both pass the check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use barberbook_core::{AccountId, Email};

use super::StoreError;
use crate::models::Account;

/// Persistent record of accounts and their confirmation/reset tokens.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new unconfirmed account and return its confirmation token.
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is already taken.
    async fn create_account(&self, email: &Email, password_hash: &str)
    -> Result<String, StoreError>;

    /// Mark the account holding `token` as confirmed and clear the token.
    ///
    /// Returns `StoreError::TokenNotFound` if no account holds the token.
    async fn confirm_email(&self, token: &str) -> Result<(), StoreError>;

    /// Look up an account by its exact email.
    async fn get_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    /// Store a fresh reset token expiring at `expires_at`, replacing any
    /// pending one.
    ///
    /// Returns `StoreError::NotFound` if no account has this email.
    async fn create_password_reset_token(
        &self,
        email: &Email,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StoreError>;

    /// Replace the password hash of the account holding an unexpired `token`
    /// and clear the reset fields.
    ///
    /// Returns `StoreError::TokenNotFound` if the token is unknown or
    /// `now >= expiry`.
    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Total number of accounts.
    async fn count_accounts(&self) -> Result<i64, StoreError>;
}

/// Generate an unguessable single-use token.
pub(crate) fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    password_hash: String,
    email_confirmed: bool,
    confirmation_token: Option<String>,
    reset_token: Option<String>,
    reset_token_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        if row.password_hash.is_empty() {
            return Err(StoreError::DataCorruption(format!(
                "account {} has an empty password hash",
                row.id
            )));
        }

        Ok(Self {
            id: AccountId::new(row.id),
            email,
            password_hash: row.password_hash,
            email_confirmed: row.email_confirmed,
            confirmation_token: row.confirmation_token,
            reset_token: row.reset_token,
            reset_token_expiry: row.reset_token_expiry,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `PostgreSQL` implementation of [`AccountStore`].
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new account store over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_account(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<String, StoreError> {
        let confirmation_token = generate_token();

        // Dropping `tx` without commit rolls the insert back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO accounts (email, password_hash, confirmation_token)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(&confirmation_token)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateEmail;
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;

        Ok(confirmation_token)
    }

    async fn confirm_email(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET email_confirmed = TRUE,
                confirmation_token = NULL,
                updated_at = NOW()
            WHERE confirmation_token = $1
            ",
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TokenNotFound);
        }

        Ok(())
    }

    async fn get_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, password_hash, email_confirmed,
                   confirmation_token, reset_token, reset_token_expiry,
                   created_at, updated_at
            FROM accounts
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn create_password_reset_token(
        &self,
        email: &Email,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let reset_token = generate_token();

        let result = sqlx::query(
            r"
            UPDATE accounts
            SET reset_token = $1,
                reset_token_expiry = $2,
                updated_at = NOW()
            WHERE email = $3
            ",
        )
        .bind(&reset_token)
        .bind(expires_at)
        .bind(email.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(reset_token)
    }

    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET password_hash = $1,
                reset_token = NULL,
                reset_token_expiry = NULL,
                updated_at = NOW()
            WHERE reset_token = $2
              AND reset_token_expiry > $3
            ",
        )
        .bind(password_hash)
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TokenNotFound);
        }

        Ok(())
    }

    async fn count_accounts(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
