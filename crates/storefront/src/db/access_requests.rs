//! Access request submissions.

use sqlx::PgPool;

use perkshop_core::{AccessRequestId, Email};

use super::RepositoryError;

/// Repository for the public "request access" form.
pub struct AccessRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccessRequestRepository<'a> {
    /// Create a new access request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether the email already has a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_pending(&self, email: &Email) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM access_requests WHERE email = $1 AND status = 'pending')",
        )
        .bind(email)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Record a new pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        email: &Email,
        full_name: &str,
        message: Option<&str>,
    ) -> Result<AccessRequestId, RepositoryError> {
        let (id,): (AccessRequestId,) = sqlx::query_as(
            "INSERT INTO access_requests (email, full_name, message) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(email)
        .bind(full_name)
        .bind(message)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }
}
