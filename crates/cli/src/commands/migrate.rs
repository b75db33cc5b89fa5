//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tronics migrate
//! ```
//!
//! # Environment Variables
//!
//! - `TRONICS_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//! - `USERS_COL_NAME` - users collection that gets the unique
//!   `username` index (default `users`)

use thiserror::Error;

use tronics_api::config::{ApiConfig, ConfigError};
use tronics_api::db::{self, DbError};
use tronics_core::types::user::USERNAME_FIELD;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Migration or index creation failed.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Run all pending migrations, then ensure usernames are unique.
///
/// # Errors
///
/// Returns `MigrationError` if the database is not configured or reachable,
/// or if a statement fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = ApiConfig::from_env()?;
    let database_url = config
        .database_url
        .as_ref()
        .ok_or(MigrationError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    db::ensure_unique_index(&pool, &config.users_collection, USERNAME_FIELD).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
