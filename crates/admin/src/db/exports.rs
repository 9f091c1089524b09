//! Export ledger and period row loaders.
//!
//! Row loaders select everything created in `[start, end)` and join the
//! employee's email where the schema carries one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use perkshop_core::csv::{ExportType, LedgerExportRow, OrderExportRow, OrderItemExportRow};
use perkshop_core::{
    ExportId, LedgerEntryId, OrderId, OrderItemId, OrderStatus, Points, ProductId, UserId,
    VariantId,
};

use super::RepositoryError;
use crate::models::MonthlyExport;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    user_email: Option<String>,
    status: OrderStatus,
    total_points: Points,
    shipping_name: Option<String>,
    shipping_address: Option<String>,
    tracking_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderExportRow {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_email: row.user_email,
            status: row.status,
            total_points: row.total_points,
            shipping_name: row.shipping_name,
            shipping_address: row.shipping_address,
            tracking_number: row.tracking_number,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    variant_id: Option<VariantId>,
    product_name: String,
    variant_name: Option<String>,
    quantity: i32,
    points_per_unit: Points,
    total_points: Points,
}

impl From<OrderItemRow> for OrderItemExportRow {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            variant_name: row.variant_name,
            quantity: row.quantity,
            points_per_unit: row.points_per_unit,
            total_points: row.total_points,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: LedgerEntryId,
    user_id: UserId,
    user_email: Option<String>,
    delta: Points,
    reason: String,
    order_id: Option<OrderId>,
    created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LedgerExportRow {
    fn from(row: LedgerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            user_email: row.user_email,
            delta: row.delta,
            reason: row.reason,
            order_id: row.order_id,
            created_at: row.created_at,
        }
    }
}

/// Repository for `monthly_exports` and export source rows.
pub struct ExportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExportRepository<'a> {
    /// Create a new export repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Recorded exports, newest period first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<MonthlyExport>, RepositoryError> {
        let exports = sqlx::query_as::<_, MonthlyExport>(
            r"
            SELECT id, period, export_type, file_path, row_count, checksum, created_at
            FROM monthly_exports
            ORDER BY period DESC, export_type
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(exports)
    }

    /// Whether `(period, type)` is already in the ledger.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(
        &self,
        period: &str,
        export_type: ExportType,
    ) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM monthly_exports WHERE period = $1 AND export_type = $2)",
        )
        .bind(period)
        .bind(export_type)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Record an uploaded file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `(period, type)` was recorded
    /// concurrently.
    pub async fn record(
        &self,
        period: &str,
        export_type: ExportType,
        file_path: &str,
        row_count: i32,
        checksum: &str,
    ) -> Result<ExportId, RepositoryError> {
        let (id,): (ExportId,) = sqlx::query_as(
            r"
            INSERT INTO monthly_exports (period, export_type, file_path, row_count, checksum)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(period)
        .bind(export_type)
        .bind(file_path)
        .bind(row_count)
        .bind(checksum)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "export"))?;
        Ok(id)
    }

    /// Orders created in `[start, end)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OrderExportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT o.id, o.user_id, p.email AS user_email, o.status, o.total_points,
                   o.shipping_name,
                   NULLIF(CONCAT_WS(', ', o.shipping_address_line1, o.shipping_address_line2,
                       o.shipping_city, o.shipping_state, o.shipping_postal_code,
                       o.shipping_country), '') AS shipping_address,
                   o.tracking_number, o.created_at
            FROM orders o
            LEFT JOIN profiles p ON p.id = o.user_id
            WHERE o.created_at >= $1 AND o.created_at < $2
            ORDER BY o.created_at, o.id
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Lines of orders created in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_items_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OrderItemExportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.id, i.order_id, i.product_id, i.variant_id, i.product_name, i.variant_name,
                   i.quantity, i.points_per_unit, i.total_points
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            WHERE o.created_at >= $1 AND o.created_at < $2
            ORDER BY o.created_at, i.order_id, i.product_name
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Ledger entries created in `[start, end)`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ledger_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LedgerExportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r"
            SELECT l.id, l.user_id, p.email AS user_email, l.delta, l.reason, l.order_id,
                   l.created_at
            FROM points_ledger l
            LEFT JOIN profiles p ON p.id = l.user_id
            WHERE l.created_at >= $1 AND l.created_at < $2
            ORDER BY l.created_at, l.id
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
