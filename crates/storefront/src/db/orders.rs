//! Order queries and checkout inserts.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use perkshop_core::{OrderId, Points, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::{Order, OrderItem, ShippingAddress};

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, status, total_points, shipping_name, \
     shipping_address_line1, shipping_address_line2, shipping_city, shipping_state, \
     shipping_postal_code, shipping_country, tracking_number, notes, created_at, updated_at, \
     shipped_at";
pub(crate) const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, product_name, \
     variant_name, quantity, points_per_unit, total_points";

/// Repository for an employee's own orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// A single order, only if it belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
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
}

/// A priced order line ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub points_per_unit: Points,
    pub total_points: Points,
}

/// Insert a pending order with its shipping snapshot.
pub(crate) async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    total: Points,
    address: &ShippingAddress,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO orders (
            user_id, status, total_points, shipping_name, shipping_address_line1,
            shipping_address_line2, shipping_city, shipping_state, shipping_postal_code,
            shipping_country
        )
        VALUES ($1, 'pending', $2, $3, $4, NULLIF($5, ''), $6, $7, $8, $9)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .bind(total)
    .bind(&address.full_name)
    .bind(&address.address_line1)
    .bind(&address.address_line2)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(&address.country)
    .fetch_one(&mut *conn)
    .await?;
    Ok(order)
}

/// Insert the lines of a freshly created order.
pub(crate) async fn insert_items(
    conn: &mut PgConnection,
    order_id: OrderId,
    items: &[NewOrderItem],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query(
            r"
            INSERT INTO order_items (
                order_id, product_id, variant_id, product_name, variant_name,
                quantity, points_per_unit, total_points
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(&item.product_name)
        .bind(&item.variant_name)
        .bind(item.quantity)
        .bind(item.points_per_unit)
        .bind(item.total_points)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Lock variant rows and return their current inventory.
pub(crate) async fn lock_inventory(
    conn: &mut PgConnection,
    variant_ids: &[VariantId],
) -> Result<Vec<(VariantId, i32)>, RepositoryError> {
    let uuids: Vec<Uuid> = variant_ids.iter().map(VariantId::as_uuid).collect();
    let rows = sqlx::query_as::<_, (VariantId, i32)>(
        "SELECT id, inventory FROM product_variants WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&uuids)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Decrement a variant's inventory. Fails if stock would go negative.
pub(crate) async fn decrement_inventory(
    conn: &mut PgConnection,
    variant_id: VariantId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE product_variants SET inventory = inventory - $2 WHERE id = $1 AND inventory >= $2",
    )
    .bind(variant_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "insufficient inventory for variant {variant_id}"
        )));
    }
    Ok(())
}
