//! Order row types.

use chrono::{DateTime, Utc};

use perkshop_core::{OrderId, OrderItemId, OrderStatus, Points, ProductId, UserId, VariantId};

/// An order row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_points: Points,
    pub shipping_name: Option<String>,
    pub shipping_address_line1: Option<String>,
    pub shipping_address_line2: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
}

impl Order {
    /// First eight characters of the ID, for display.
    #[must_use]
    pub fn short_id(&self) -> String {
        short_id(self.id)
    }

    /// Shipping address on one line.
    #[must_use]
    pub fn shipping_one_line(&self) -> String {
        [
            &self.shipping_address_line1,
            &self.shipping_address_line2,
            &self.shipping_city,
            &self.shipping_state,
            &self.shipping_postal_code,
            &self.shipping_country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// First eight characters of an order ID.
#[must_use]
pub fn short_id(id: OrderId) -> String {
    id.to_string().chars().take(8).collect()
}

/// An order line row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub points_per_unit: Points,
    pub total_points: Points,
}
