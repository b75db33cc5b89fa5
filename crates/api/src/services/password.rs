//! Password hashing.
//!
//! Argon2id with a fixed work factor. Hashes are stored as PHC strings, so
//! the parameters used to create a hash travel with it.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur while hashing or verifying passwords.
#[derive(Debug, Error)]
pub enum HashError {
    /// The hasher failed to produce a hash.
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    /// The stored hash cannot be parsed.
    #[error("stored password hash is malformed")]
    MalformedHash,

    /// The blocking task was cancelled or panicked.
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One-way password hasher.
///
/// Hashing is CPU-bound; the async methods run it on the blocking pool.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher {
    /// Argon2id v0x13, 19 MiB, 2 iterations, 1 lane.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }

    /// Use custom Argon2 parameters.
    #[must_use]
    pub const fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns `HashError::Hash` if Argon2 rejects the input.
    pub fn hash_blocking(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(HashError::Hash)
    }

    /// Verify a password against a stored hash on the calling thread.
    ///
    /// A mismatch is `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `HashError::MalformedHash` if `hash` is not a usable PHC string.
    pub fn verify_blocking(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|_| HashError::MalformedHash)?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(HashError::MalformedHash),
        }
    }

    /// Hash a password on the blocking pool.
    ///
    /// # Errors
    ///
    /// See [`CredentialHasher::hash_blocking`].
    pub async fn hash(&self, password: SecretString) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(password.expose_secret())).await?
    }

    /// Verify a password on the blocking pool.
    ///
    /// # Errors
    ///
    /// See [`CredentialHasher::verify_blocking`].
    pub async fn verify(&self, password: SecretString, hash: String) -> Result<bool, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(password.expose_secret(), &hash))
            .await?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fast() -> CredentialHasher {
        CredentialHasher::with_params(
            Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None).unwrap(),
        )
    }

    #[test]
    fn test_default_params() {
        let hash = CredentialHasher::new().hash_blocking("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast();
        let hash = hasher.hash_blocking("correct horse").unwrap();

        assert!(!hash.contains("correct horse"));
        assert!(hasher.verify_blocking("correct horse", &hash).unwrap());
        assert!(!hasher.verify_blocking("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = fast();
        let a = hasher.hash_blocking("same").unwrap();
        let b = hasher.hash_blocking("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash() {
        let result = fast().verify_blocking("anything", "not-a-phc-string");
        assert!(matches!(result, Err(HashError::MalformedHash)));
    }

    #[test]
    fn test_verifies_hash_made_with_other_params() {
        // parameters are read from the PHC string, not from the verifier
        let hash = fast().hash_blocking("pw123456").unwrap();
        assert!(CredentialHasher::new().verify_blocking("pw123456", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let hasher = fast();
        let hash = hasher
            .hash(SecretString::from("hunter22"))
            .await
            .unwrap();
        assert!(hasher
            .verify(SecretString::from("hunter22"), hash)
            .await
            .unwrap());
    }
}
