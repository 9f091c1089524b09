//! Password reset tokens.
//!
//! Only the SHA-256 hex digest of a token is stored. A token is consumed
//! atomically: the `UPDATE ... RETURNING` either marks it used and yields
//! the owner, or matches nothing.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use perkshop_core::UserId;

use super::RepositoryError;

/// Repository for password reset tokens.
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
    /// Returns `RepositoryError::Conflict` on a (vanishingly unlikely) hash collision.
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

    /// Whether an unused, unexpired token with this hash exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_valid(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let (valid,): (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS (
                SELECT 1 FROM password_reset_tokens
                WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            )
            ",
        )
        .bind(token_hash)
        .fetch_one(self.pool)
        .await?;
        Ok(valid)
    }
}

/// Mark a token used and return its owner, if it was still valid.
pub(crate) async fn consume(
    conn: &mut PgConnection,
    token_hash: &str,
) -> Result<Option<UserId>, RepositoryError> {
    let row: Option<(UserId,)> = sqlx::query_as(
        r"
        UPDATE password_reset_tokens
        SET used_at = NOW()
        WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
        RETURNING user_id
        ",
    )
    .bind(token_hash)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|(id,)| id))
}
