//! Access request review.

use sqlx::PgPool;

use perkshop_core::{AccessRequestId, UserId};

use super::RepositoryError;
use crate::models::AccessRequest;

const REQUEST_COLUMNS: &str =
    "id, email, full_name, message, status, created_at, reviewed_at, reviewed_by";

/// Result of approving a request.
#[derive(Debug, Clone)]
pub struct Approval {
    pub request: AccessRequest,
    /// Profile the requester can now log in with.
    pub user_id: UserId,
    /// Whether the profile was created by this approval.
    pub created: bool,
}

/// Repository for the access request queue.
pub struct AccessRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccessRequestRepository<'a> {
    /// Create a new access request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Pending requests, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<AccessRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, AccessRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM access_requests WHERE status = 'pending' ORDER BY created_at"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(requests)
    }

    /// Number of pending requests.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM access_requests WHERE status = 'pending'")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Approve a pending request.
    ///
    /// Creates an active `user` profile for the requester unless one already
    /// exists with that email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no pending request has this ID.
    pub async fn approve(
        &self,
        id: AccessRequestId,
        reviewer: UserId,
    ) -> Result<Approval, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, AccessRequest>(&format!(
            r"
            UPDATE access_requests
            SET status = 'approved', reviewed_at = NOW(), reviewed_by = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(reviewer)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let inserted: Option<(UserId,)> = sqlx::query_as(
            r"
            INSERT INTO profiles (email, full_name, role, is_active)
            VALUES ($1, $2, 'user', TRUE)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            ",
        )
        .bind(&request.email)
        .bind(&request.full_name)
        .fetch_optional(&mut *tx)
        .await?;

        let (user_id, created) = match inserted {
            Some((id,)) => (id, true),
            None => {
                let (id,): (UserId,) = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
                    .bind(&request.email)
                    .fetch_one(&mut *tx)
                    .await?;
                (id, false)
            }
        };

        tx.commit().await?;

        Ok(Approval {
            request,
            user_id,
            created,
        })
    }

    /// Deny a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no pending request has this ID.
    pub async fn deny(
        &self,
        id: AccessRequestId,
        reviewer: UserId,
    ) -> Result<AccessRequest, RepositoryError> {
        sqlx::query_as::<_, AccessRequest>(&format!(
            r"
            UPDATE access_requests
            SET status = 'denied', reviewed_at = NOW(), reviewed_by = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(reviewer)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
