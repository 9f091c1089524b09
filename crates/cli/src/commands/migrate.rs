//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded into
//! the binary at compile time. Both web binaries share the schema.

use super::{CommandError, connect};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
