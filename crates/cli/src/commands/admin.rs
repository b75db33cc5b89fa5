//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Register a new admin account
//! tronics admin create -e admin@tronics.io -p 'correct horse battery'
//!
//! # Promote an account registered over HTTP
//! tronics admin promote -e buyer@tronics.io
//! ```
//!
//! # Environment Variables
//!
//! - `TRONICS_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_TOKEN_SECRET` - required by the shared configuration loader

use std::sync::Arc;

use thiserror::Error;

use tronics_api::config::{ApiConfig, ConfigError};
use tronics_api::db::{self, postgres::PgCollection};
use tronics_api::services::{AuthError, CredentialHasher, TokenManager, UserService};
use tronics_core::Credentials;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// The account operation was rejected.
    #[error(transparent)]
    Account(#[from] AuthError),
}

/// Register a new admin account.
///
/// # Errors
///
/// Returns `AdminError::Account` if the credentials are invalid or the
/// account already exists.
pub async fn create_user(email: String, password: String) -> Result<(), AdminError> {
    let users = connect().await?;

    tracing::info!("Creating admin account: {}", email);
    let user = users
        .register_admin(&Credentials::new(email, password))
        .await?;

    tracing::info!("Admin account created successfully! Email: {}", user.email);
    Ok(())
}

/// Grant the admin flag to an existing account.
///
/// # Errors
///
/// Returns `AdminError::Account` if no account has this email.
pub async fn promote_user(email: &str) -> Result<(), AdminError> {
    let users = connect().await?;

    users.promote(email).await?;

    tracing::info!("{} is now an admin", email);
    tracing::warn!("Tokens issued before the promotion keep their old claims until they expire.");
    Ok(())
}

async fn connect() -> Result<UserService, AdminError> {
    let config = ApiConfig::from_env()?;
    let database_url = config
        .database_url
        .as_ref()
        .ok_or(AdminError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    Ok(UserService::new(
        Arc::new(PgCollection::new(pool, &config.users_collection)),
        CredentialHasher::new(),
        TokenManager::new(&config.token_secret),
    ))
}
