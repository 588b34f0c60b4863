//! Application state shared across handlers.

use std::sync::Arc;

use chrono::TimeDelta;
use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::PgAccountStore;
use crate::middleware::{AdmissionError, AdmissionGate};
use crate::services::{
    AccountService, AccountSettings, CredentialHasher, DisabledEmailGateway, EmailGateway,
    SmtpEmailGateway, TokenIssuer,
};

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid admission gate: {0}")]
    Admission(#[from] AdmissionError),
    #[error("failed to set up SMTP transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and the account service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    accounts: AccountService,
    gate: AdmissionGate,
}

impl AppState {
    /// Assemble state from already-built parts.
    #[must_use]
    pub fn new(pool: PgPool, accounts: AccountService, gate: AdmissionGate) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                accounts,
                gate,
            }),
        }
    }

    /// Build the production state: `PostgreSQL` account store, SMTP mailer
    /// when configured, argon2 defaults and the configured signing key.
    ///
    /// # Errors
    ///
    /// Returns an error if the admission interval is zero or the SMTP relay
    /// cannot be set up.
    pub fn from_config(config: &ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let gate = AdmissionGate::new(config.admission_interval)?;

        let mailer: Arc<dyn EmailGateway> = match &config.email {
            Some(email) => Arc::new(SmtpEmailGateway::new(email)?),
            None => {
                tracing::warn!("SMTP not configured; confirmation and reset emails will not be sent");
                Arc::new(DisabledEmailGateway)
            }
        };

        let settings = AccountSettings {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            reset_token_ttl: TimeDelta::hours(i64::from(config.reset_token_ttl_hours)),
        };

        let accounts = AccountService::new(
            Arc::new(PgAccountStore::new(pool.clone())),
            mailer,
            CredentialHasher::new(),
            TokenIssuer::new(&config.token_secret, config.token_ttl),
            settings,
        );

        Ok(Self::new(pool, accounts, gate))
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the account service.
    #[must_use]
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    /// Get a reference to the global admission gate.
    #[must_use]
    pub fn gate(&self) -> &AdmissionGate {
        &self.inner.gate
    }
}
