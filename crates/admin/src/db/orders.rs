//! Order fulfilment queries.
//!
//! Status changes run in one transaction that locks the order row. A
//! cancellation appends a refund of the order total to the ledger; since a
//! cancelled order can no longer change status, the refund happens once.

use sqlx::PgPool;

use perkshop_core::{OrderId, OrderStatus, Points};

use super::{RepositoryError, ledger};
use crate::models::{Order, OrderItem, OrderSummary};

const ORDER_COLUMNS: &str = "id, user_id, status, total_points, shipping_name, \
     shipping_address_line1, shipping_address_line2, shipping_city, shipping_state, \
     shipping_postal_code, shipping_country, tracking_number, notes, created_at, updated_at, \
     shipped_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, product_name, \
     variant_name, quantity, points_per_unit, total_points";

/// Result of a status update.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// The order after the update.
    pub order: Order,
    /// Status before the update.
    pub previous: OrderStatus,
    /// Points refunded by this update, if it cancelled the order.
    pub refunded: Option<Points>,
}

impl StatusChange {
    /// Whether this update moved the order into `shipped`.
    #[must_use]
    pub fn newly_shipped(&self) -> bool {
        self.order.status == OrderStatus::Shipped && self.previous != OrderStatus::Shipped
    }
}

/// Repository for orders across all employees.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.user_id, p.email AS user_email, p.full_name AS user_name, o.status,
                   o.total_points,
                   (SELECT COALESCE(SUM(i.quantity), 0)::BIGINT
                    FROM order_items i WHERE i.order_id = o.id) AS item_count,
                   o.created_at
            FROM orders o
            JOIN profiles p ON p.id = o.user_id
            WHERE $1::order_status IS NULL OR o.status = $1
            ORDER BY o.created_at DESC
            LIMIT $2
            ",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY product_name"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Number of orders waiting to be processed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Change an order's status and tracking number.
    ///
    /// A blank tracking number keeps the stored one. Moving to `shipped`
    /// stamps `shipped_at` the first time. Moving to `cancelled` refunds the
    /// order total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown orders and
    /// `RepositoryError::Conflict` when the order is already cancelled.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (previous,): (OrderStatus,) =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        if previous == OrderStatus::Cancelled {
            return Err(RepositoryError::Conflict(
                "cancelled orders cannot change status".to_string(),
            ));
        }

        let tracking = tracking_number.map(str::trim).filter(|t| !t.is_empty());
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE orders
            SET status = $2,
                tracking_number = COALESCE($3, tracking_number),
                shipped_at = CASE
                    WHEN $2 = 'shipped'::order_status THEN COALESCE(shipped_at, NOW())
                    ELSE shipped_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(tracking)
        .fetch_one(&mut *tx)
        .await?;

        let refunded = if status == OrderStatus::Cancelled && order.total_points.value() > 0 {
            let reason = format!("Refund for cancelled order #{}", order.short_id());
            ledger::append(
                &mut tx,
                order.user_id,
                order.total_points,
                &reason,
                Some(order.id),
                None,
            )
            .await?;
            Some(order.total_points)
        } else {
            None
        };

        tx.commit().await?;

        Ok(StatusChange {
            order,
            previous,
            refunded,
        })
    }
}
