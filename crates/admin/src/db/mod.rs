//! Database operations for the admin panel.
//!
//! The admin panel shares the storefront's database and has write access to
//! every table.
//!
//! ## Tables used
//!
//! - `profiles` - Employees and admins (role, active flag)
//! - `products`, `product_variants` - Catalog management
//! - `orders`, `order_items` - Fulfilment and status changes
//! - `points_ledger` - Manual adjustments and cancellation refunds
//! - `access_requests` - Review queue
//! - `monthly_exports` - One row per exported `(period, type)`
//! - `password_reset_tokens` - Set-password links for approved requests
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p perkshop-cli -- migrate
//! ```

pub mod access_requests;
pub mod exports;
pub mod ledger;
pub mod orders;
pub mod products;
pub mod reports;
pub mod reset_tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use access_requests::AccessRequestRepository;
pub use exports::ExportRepository;
pub use ledger::LedgerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reports::ReportRepository;
pub use reset_tokens::ResetTokenRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
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
