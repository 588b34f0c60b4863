//! Database operations for the server `PostgreSQL`.
//!
//! ## Tables
//!
//! - `accounts` - Registration, confirmation and password reset state
//! - `barbers` - Listing data (read-only from the server)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p barberbook-cli -- migrate
//! ```

pub mod accounts;
pub mod barbers;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::{AccountStore, PgAccountStore};
pub use barbers::BarberRepository;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryAccountStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The unique constraint on `accounts.email` rejected an insert.
    #[error("email already registered")]
    DuplicateEmail,

    /// No row matched a confirmation or reset token (unknown, used or expired).
    #[error("token not found")]
    TokenNotFound,

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
