//! Argon2id credential hashing.

use std::sync::Arc;
#[cfg(any(test, feature = "test-support"))]
use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Hashing failed (entropy or resource failure in the underlying library).
#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// One-way password digests in PHC string format.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Digest of a throwaway password with this hasher's parameters. Checked
    /// when there is no stored digest so every failed login costs one
    /// argon2 run.
    decoy_digest: Arc<str>,
    #[cfg(any(test, feature = "test-support"))]
    verifications: Arc<AtomicUsize>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::with_argon2(Argon2::default())
    }
}

impl CredentialHasher {
    /// Hasher with the argon2 default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal-cost parameters so tests do not spend seconds per hash.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn insecure_fast() -> Self {
        use argon2::{Algorithm, Params, Version};

        let params = Params::new(8, 1, 1, None).unwrap_or_default();
        Self::with_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn with_argon2(argon2: Argon2<'static>) -> Self {
        let salt = SaltString::generate(&mut OsRng);
        let decoy_digest = argon2
            .hash_password(b"decoy-credential", &salt)
            .map(|hash| hash.to_string())
            .unwrap_or_default();

        Self {
            argon2,
            decoy_digest: decoy_digest.into(),
            #[cfg(any(test, feature = "test-support"))]
            verifications: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the argon2 computation fails.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    /// Check `plaintext` against a stored digest.
    ///
    /// A digest that does not parse verifies as `false`.
    #[must_use]
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        #[cfg(any(test, feature = "test-support"))]
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };

        // Parameters come from the digest itself, so a hasher with cheaper
        // settings still verifies production digests.
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one verification against the decoy digest.
    ///
    /// Used when no account matches so the caller takes as long as a
    /// wrong-password check.
    pub fn verify_decoy(&self, plaintext: &str) {
        let _ = self.verify(&self.decoy_digest, plaintext);
    }

    /// Number of `verify` calls made through this hasher or its clones.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}
