//! Subcommand implementations.
//!
//! Every command connects with `DATABASE_URL`, loading `.env` first.

pub mod admin;
pub mod export;
pub mod migrate;
pub mod points;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use perkshop_admin::config::ConfigError;
use perkshop_admin::db::{self, RepositoryError};
use perkshop_admin::services::AdminAuthError;
use perkshop_admin::services::exports::StorageError;

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Admin account operation failed.
    #[error(transparent)]
    Auth(#[from] AdminAuthError),

    /// Export storage settings are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Export storage could not be set up.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Report could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input.
    #[error("{0}")]
    Invalid(String),
}

/// Connect to `DATABASE_URL`.
async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
