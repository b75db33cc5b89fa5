//! Persistence backends.
//!
//! # Backends
//!
//! - [`memory::MemoryCollection`] - process memory, used when no database is configured
//! - [`postgres::PgCollection`] - `PostgreSQL`, one shared `documents` table with JSONB bodies
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tronics-cli -- migrate
//! ```
//! The server never runs them on startup.

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tronics_core::CollectionStore;
use tronics_core::types::user::USERNAME_FIELD;

use crate::config::ApiConfig;
use memory::MemoryCollection;
use postgres::PgCollection;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Errors that can occur while preparing the database.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A name interpolated into DDL is not a plain identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
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
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `DbError::Migration` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a unique index on `data->>field` for one collection.
///
/// Idempotent. Both names are interpolated into DDL, so they must match
/// `[A-Za-z0-9_]+`.
///
/// # Errors
///
/// Returns `DbError::InvalidIdentifier` for unsafe names and
/// `DbError::Database` if the statement fails (e.g. existing duplicates).
pub async fn ensure_unique_index(
    pool: &PgPool,
    collection: &str,
    field: &str,
) -> Result<(), DbError> {
    for name in [collection, field] {
        if !is_plain_identifier(name) {
            return Err(DbError::InvalidIdentifier(name.to_owned()));
        }
    }

    let statement = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS documents_{collection}_{field}_key \
         ON documents ((data->>'{field}')) WHERE collection = '{collection}'"
    );
    sqlx::query(&statement).execute(pool).await?;

    tracing::info!(collection, field, "unique index ensured");
    Ok(())
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The collections the API works with.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn CollectionStore>,
    pub users: Arc<dyn CollectionStore>,
}

impl Stores {
    /// Fresh in-memory collections, with `username` unique among users.
    #[must_use]
    pub fn in_memory(config: &ApiConfig) -> Self {
        Self {
            products: Arc::new(MemoryCollection::new(&config.products_collection)),
            users: Arc::new(
                MemoryCollection::new(&config.users_collection).with_unique_key(USERNAME_FIELD),
            ),
        }
    }

    /// Collections in `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: &PgPool, config: &ApiConfig) -> Self {
        Self {
            products: Arc::new(PgCollection::new(pool.clone(), &config.products_collection)),
            users: Arc::new(PgCollection::new(pool.clone(), &config.users_collection)),
        }
    }

    /// Connect to the configured database, or fall back to memory.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if a database is configured but unreachable.
    pub async fn connect(config: &ApiConfig) -> Result<Self, sqlx::Error> {
        match &config.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                tracing::info!("Database pool created");
                Ok(Self::postgres(&pool, config))
            }
            None => {
                tracing::warn!("No database configured; using in-memory stores (data is lost on exit)");
                Ok(Self::in_memory(config))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("users"));
        assert!(is_plain_identifier("users_v2"));
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("users'; drop table documents; --"));
        assert!(!is_plain_identifier("user-name"));
    }
}
