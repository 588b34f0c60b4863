//! Account service error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::services::password::HashError;
use crate::services::token::TokenError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Password hashing error.
    #[error(transparent)]
    Hashing(#[from] HashError),

    /// Login token could not be signed.
    #[error(transparent)]
    Signing(#[from] TokenError),

    /// The email is already registered.
    #[error("email already registered")]
    DuplicateEmail,

    /// Confirmation or reset token is unknown, used, or expired.
    #[error("invalid or expired token")]
    TokenNotFound,

    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("incorrect email or password")]
    Authentication,

    /// Storage failure.
    #[error("storage error: {0}")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::TokenNotFound => Self::TokenNotFound,
            other => Self::Persistence(other),
        }
    }
}
