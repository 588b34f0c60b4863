//! In-memory [`AccountStore`] for tests.
//!
//! Mirrors the `PostgreSQL` constraints: unique email, single-use tokens and
//! reset expiry checked under the same lock that performs the write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use barberbook_core::{AccountId, Email};

use super::StoreError;
use super::accounts::{AccountStore, generate_token};
use crate::models::Account;

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    accounts: Vec<Account>,
}

/// Account store backed by a `Vec` behind an async mutex.
#[derive(Default)]
pub struct MemoryAccountStore {
    state: Mutex<MemoryState>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the account with this exact email, if any.
    pub async fn account(&self, email: &str) -> Option<Account> {
        let state = self.state.lock().await;
        state
            .accounts
            .iter()
            .find(|a| a.email.as_str() == email)
            .cloned()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_account(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<String, StoreError> {
        let mut state = self.state.lock().await;

        if state.accounts.iter().any(|a| a.email == *email) {
            return Err(StoreError::DuplicateEmail);
        }

        state.next_id += 1;
        let now = Utc::now();
        let confirmation_token = generate_token();
        let account = Account {
            id: AccountId::new(state.next_id),
            email: email.clone(),
            password_hash: password_hash.to_owned(),
            email_confirmed: false,
            confirmation_token: Some(confirmation_token.clone()),
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.push(account);

        Ok(confirmation_token)
    }

    async fn confirm_email(&self, token: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.confirmation_token.as_deref() == Some(token))
            .ok_or(StoreError::TokenNotFound)?;

        account.email_confirmed = true;
        account.confirmation_token = None;
        account.updated_at = Utc::now();

        Ok(())
    }

    async fn get_account_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        Ok(self.account(email.as_str()).await)
    }

    async fn create_password_reset_token(
        &self,
        email: &Email,
        expires_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.email == *email)
            .ok_or(StoreError::NotFound)?;

        let reset_token = generate_token();
        account.reset_token = Some(reset_token.clone());
        account.reset_token_expiry = Some(expires_at);
        account.updated_at = Utc::now();

        Ok(reset_token)
    }

    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.reset_token.as_deref() == Some(token) && a.has_pending_reset(now))
            .ok_or(StoreError::TokenNotFound)?;

        password_hash.clone_into(&mut account.password_hash);
        account.reset_token = None;
        account.reset_token_expiry = None;
        account.updated_at = Utc::now();

        Ok(())
    }

    async fn count_accounts(&self) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        Ok(i64::try_from(state.accounts.len()).unwrap_or(i64::MAX))
    }
}
