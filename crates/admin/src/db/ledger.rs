//! Points ledger writes and reads.
//!
//! The ledger is append-only: adjustments and refunds insert rows, nothing
//! updates or deletes them.

use sqlx::{PgConnection, PgPool};

use perkshop_core::{OrderId, Points, UserId};

use super::RepositoryError;
use crate::models::LedgerEntry;

/// Repository for ledger entries.
pub struct LedgerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LedgerRepository<'a> {
    /// Create a new ledger repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance of a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn balance(&self, user_id: UserId) -> Result<Points, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        balance(&mut conn, user_id).await
    }

    /// Ledger history of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r"
            SELECT l.id, l.user_id, l.delta, l.reason, l.order_id,
                   a.email AS created_by_email, l.created_at
            FROM points_ledger l
            LEFT JOIN profiles a ON a.id = l.created_by
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Every delta ever recorded, for the issued/redeemed summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all_deltas(&self) -> Result<Vec<Points>, RepositoryError> {
        let rows: Vec<(Points,)> = sqlx::query_as("SELECT delta FROM points_ledger")
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|(delta,)| delta).collect())
    }

    /// Append a manual adjustment made by an admin.
    ///
    /// Debits may not take the balance below zero. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when a debit exceeds the balance
    /// and `RepositoryError::NotFound` for unknown users.
    pub async fn adjust(
        &self,
        user_id: UserId,
        delta: Points,
        reason: &str,
        created_by: Option<UserId>,
    ) -> Result<Points, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serialise concurrent adjustments for the same user.
        sqlx::query("SELECT id FROM profiles WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let current = balance(&mut tx, user_id).await?;
        let updated = current + delta;
        if updated.value() < 0 {
            return Err(RepositoryError::Conflict(format!(
                "balance is {current} points"
            )));
        }

        append(&mut tx, user_id, delta, reason, None, created_by).await?;
        tx.commit().await?;
        Ok(updated)
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
    created_by: Option<UserId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO points_ledger (user_id, delta, reason, order_id, created_by)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(user_id)
    .bind(delta)
    .bind(reason)
    .bind(order_id)
    .bind(created_by)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
