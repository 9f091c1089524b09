//! Points ledger queries.

use sqlx::{PgConnection, PgPool};

use perkshop_core::{OrderId, Points, UserId};

use super::RepositoryError;
use crate::models::LedgerEntry;

/// Repository for a user's points.
pub struct PointsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PointsRepository<'a> {
    /// Create a new points repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance: the sum of all ledger deltas.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn balance(&self, user_id: UserId) -> Result<Points, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        balance(&mut conn, user_id).await
    }

    /// Ledger history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r"
            SELECT id, user_id, delta, reason, order_id, created_at
            FROM points_ledger
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }
}

/// Balance inside a transaction.
pub(crate) async fn balance(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Points, RepositoryError> {
    let (sum,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM points_ledger WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(Points::new(sum))
}

/// Append a ledger entry.
pub(crate) async fn append(
    conn: &mut PgConnection,
    user_id: UserId,
    delta: Points,
    reason: &str,
    order_id: Option<OrderId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO points_ledger (user_id, delta, reason, order_id) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(delta)
    .bind(reason)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
