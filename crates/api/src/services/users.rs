//! User registration and authentication.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use tronics_core::store::{from_document, to_document};
use tronics_core::types::user::{IS_ADMIN_FIELD, USERNAME_FIELD};
use tronics_core::{
    CollectionStore, Credentials, Document, Email, Filter, StoreError, User, Validate,
    ValidationErrors,
};

use super::password::{CredentialHasher, HashError};
use super::token::{TokenError, TokenManager};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credentials broke a field rule.
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationErrors),

    /// An account with this email already exists.
    #[error("user already exists")]
    UserExists,

    /// No account with this email exists.
    #[error("user not found")]
    UserNotFound,

    /// The password does not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Looking up the account failed.
    #[error("user lookup failed: {0}")]
    LookupFailed(#[source] StoreError),

    /// Writing the account failed.
    #[error("user persist failed: {0}")]
    PersistFailed(#[source] StoreError),

    /// Password hashing failed.
    #[error(transparent)]
    Hashing(#[from] HashError),

    /// The token signer is misconfigured.
    #[error("token signing failed: {0}")]
    TokenSigningFailed(#[source] TokenError),
}

/// Account registration, login and token issuance.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CollectionStore>,
    hasher: CredentialHasher,
    tokens: TokenManager,
}

impl UserService {
    /// Create a user service over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn CollectionStore>,
        hasher: CredentialHasher,
        tokens: TokenManager,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a regular (non-admin) account.
    ///
    /// # Errors
    ///
    /// `ValidationFailed`, `UserExists`, `LookupFailed`, `PersistFailed`, or a
    /// hashing failure.
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn register(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.create_account(credentials, false).await
    }

    /// Register an admin account.
    ///
    /// # Errors
    ///
    /// Same as [`UserService::register`].
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn register_admin(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.create_account(credentials, true).await
    }

    async fn create_account(
        &self,
        credentials: &Credentials,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        credentials.validate()?;
        let email = parse_email(&credentials.username)?;

        if self.lookup(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let user = User {
            email,
            password_hash: self.hasher.hash(credentials.password.clone()).await?,
            is_admin,
        };

        let document = to_document(&user).map_err(AuthError::PersistFailed)?;
        match self.store.insert_one(document).await {
            Ok(_) => {}
            // a concurrent registration won the race
            Err(StoreError::Duplicate { .. }) => return Err(AuthError::UserExists),
            Err(e) => return Err(AuthError::PersistFailed(e)),
        }

        tracing::info!(is_admin, "user registered");
        Ok(user)
    }

    /// Check credentials against the stored account.
    ///
    /// # Errors
    ///
    /// `ValidationFailed`, `UserNotFound`, `InvalidCredentials` or
    /// `LookupFailed`.
    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthError> {
        credentials.validate()?;
        let email = parse_email(&credentials.username)?;

        let document = self.lookup(&email).await?.ok_or(AuthError::UserNotFound)?;
        let user: User = from_document(document).map_err(AuthError::LookupFailed)?;

        match self
            .hasher
            .verify(credentials.password.clone(), user.password_hash.clone())
            .await
        {
            Ok(true) => Ok(user),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(HashError::MalformedHash) => {
                tracing::warn!("stored password hash is malformed");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Issue a token for `user`.
    ///
    /// # Errors
    ///
    /// `TokenSigningFailed` if the signer is misconfigured.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        self.tokens
            .issue(user.is_admin, user.email.as_str())
            .map_err(AuthError::TokenSigningFailed)
    }

    /// Grant the admin flag to an existing account.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` for a malformed email, `UserNotFound`, or
    /// `PersistFailed`.
    #[instrument(skip(self))]
    pub async fn promote(&self, username: &str) -> Result<(), AuthError> {
        let email = parse_email(username)?;

        let mut set = Document::new();
        set.insert(IS_ADMIN_FIELD.to_owned(), Value::Bool(true));

        let matched = self
            .store
            .update_one(&by_username(&email), set)
            .await
            .map_err(AuthError::PersistFailed)?;

        if matched == 0 {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!("user promoted to admin");
        Ok(())
    }

    async fn lookup(&self, email: &Email) -> Result<Option<Document>, AuthError> {
        self.store
            .find_one(&by_username(email))
            .await
            .map_err(AuthError::LookupFailed)
    }
}

fn by_username(email: &Email) -> Filter {
    Filter::all().eq(USERNAME_FIELD, email.as_str())
}

fn parse_email(raw: &str) -> Result<Email, AuthError> {
    Email::parse(raw).map_err(|e| {
        AuthError::ValidationFailed(ValidationErrors::single(USERNAME_FIELD, e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::Params;
    use secrecy::SecretString;

    use super::*;
    use crate::db::memory::MemoryCollection;

    fn service() -> UserService {
        let store = MemoryCollection::new("users").with_unique_key(USERNAME_FIELD);
        let hasher = CredentialHasher::with_params(
            Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None).unwrap(),
        );
        let tokens = TokenManager::new(&SecretString::from("k7Qp2Vx9Lm4Rt8Ws1Yz6Bn3Hd5Jf0Gc"));
        UserService::new(Arc::new(store), hasher, tokens)
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let users = service();
        let user = users
            .register(&Credentials::new("buyer@tronics.io", "12345678"))
            .await
            .unwrap();

        assert_eq!(user.email.as_str(), "buyer@tronics.io");
        assert!(!user.is_admin);
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(!user.password_hash.contains("12345678"));
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let users = service();
        let creds = Credentials::new("buyer@tronics.io", "12345678");
        users.register(&creds).await.unwrap();

        assert!(matches!(
            users.register(&creds).await,
            Err(AuthError::UserExists)
        ));
    }

    #[tokio::test]
    async fn test_register_validates() {
        let result = service()
            .register(&Credentials::new("buyer@tronics.io", "12345"))
            .await;
        match result {
            Err(AuthError::ValidationFailed(errors)) => assert!(errors.has_field("password")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate() {
        let users = service();
        users
            .register(&Credentials::new("buyer@tronics.io", "12345678"))
            .await
            .unwrap();

        let user = users
            .authenticate(&Credentials::new("buyer@tronics.io", "12345678"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "buyer@tronics.io");

        assert!(matches!(
            users
                .authenticate(&Credentials::new("buyer@tronics.io", "87654321"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            users
                .authenticate(&Credentials::new("ghost@tronics.io", "12345678"))
                .await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_admin_registration_and_token() {
        let users = service();
        let admin = users
            .register_admin(&Credentials::new("admin@tronics.io", "12345678"))
            .await
            .unwrap();
        assert!(admin.is_admin);

        let token = users.issue_token(&admin).unwrap();
        let claims = users.tokens.verify(&token).unwrap();
        assert!(claims.authorized);
        assert_eq!(claims.user_id, "admin@tronics.io");
    }

    #[tokio::test]
    async fn test_promote() {
        let users = service();
        let creds = Credentials::new("buyer@tronics.io", "12345678");
        users.register(&creds).await.unwrap();

        users.promote("buyer@tronics.io").await.unwrap();
        assert!(users.authenticate(&creds).await.unwrap().is_admin);

        assert!(matches!(
            users.promote("ghost@tronics.io").await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_malformed_stored_hash_is_invalid_credentials() {
        let users = service();
        let user = User {
            email: Email::parse("legacy@tronics.io").unwrap(),
            password_hash: "plaintext-oops".into(),
            is_admin: false,
        };
        users
            .store
            .insert_one(to_document(&user).unwrap())
            .await
            .unwrap();

        assert!(matches!(
            users
                .authenticate(&Credentials::new("legacy@tronics.io", "plaintext-oops"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
