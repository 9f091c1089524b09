//! Set-password tokens for newly approved employees.
//!
//! Tokens share the storefront's `password_reset_tokens` table, so the
//! storefront's reset page consumes them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use perkshop_core::UserId;

use super::RepositoryError;

/// Repository for issuing reset tokens.
pub struct ResetTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResetTokenRepository<'a> {
    /// Create a new reset token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a hash collision.
    pub async fn create(
        &self,
        token_hash: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "reset token"))?;
        Ok(())
    }
}
