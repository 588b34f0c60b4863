//! Signed bearer tokens (JWT, HS256).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use barberbook_core::{AccountId, Email};

/// Errors from signing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Encoding the claims failed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Signature, structure or expiry check failed.
    #[error("token rejected: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the token was issued to.
    pub sub: AccountId,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, present only when a TTL is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies bearer tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: Option<i64>,
}

impl TokenIssuer {
    /// Create an issuer. With `ttl` unset tokens carry no `exp` and never expire.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Option<Duration>) -> Self {
        let secret = secret.expose_secret().as_bytes();
        let ttl_secs = ttl.map(|ttl| i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX));

        let mut validation = Validation::new(Algorithm::HS256);
        if ttl_secs.is_none() {
            validation.required_spec_claims.clear();
            validation.validate_exp = false;
        }

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Sign a token binding `account_id` and `email`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, account_id: AccountId, email: &Email) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id,
            email: email.as_str().to_owned(),
            iat,
            exp: self.ttl_secs.map(|ttl| iat.saturating_add(ttl)),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Check the signature (and expiry, when present) and return the claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token does not verify.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
