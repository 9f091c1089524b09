//! Raw inputs for the dashboard and reports aggregates.
//!
//! Aggregation itself lives in `perkshop_core::reporting`; these queries
//! only fetch rows in a stable order.

use sqlx::PgPool;

use perkshop_core::reporting::SoldItem;
use perkshop_core::{Points, ProductId};

use super::RepositoryError;

/// Repository for report inputs.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Lines of non-cancelled orders, oldest order first.
    ///
    /// Lines whose product was deleted are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for a non-positive quantity.
    pub async fn sold_items(&self) -> Result<Vec<SoldItem>, RepositoryError> {
        let rows: Vec<(ProductId, String, i32)> = sqlx::query_as(
            r"
            SELECT i.product_id, i.product_name, i.quantity
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            WHERE o.status <> 'cancelled' AND i.product_id IS NOT NULL
            ORDER BY o.created_at, i.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(product_id, product_name, quantity)| {
                let quantity = u32::try_from(quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "order line quantity {quantity} for {product_id}"
                    ))
                })?;
                Ok(SoldItem {
                    product_id,
                    product_name,
                    quantity,
                })
            })
            .collect()
    }

    /// Totals of non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_totals(&self) -> Result<Vec<Points>, RepositoryError> {
        let rows: Vec<(Points,)> =
            sqlx::query_as("SELECT total_points FROM orders WHERE status <> 'cancelled'")
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(|(total,)| total).collect())
    }
}
