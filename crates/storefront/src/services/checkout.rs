//! Order placement.
//!
//! Everything happens in one transaction: the profile row is locked so two
//! checkouts by the same employee serialise on the balance check, and the
//! referenced variants are locked before their stock is read.

use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;

use perkshop_core::cart::{Cart, EnrichedCart, EnrichedLine, enrich_cart};
use perkshop_core::{ConversionRate, Points, UserId, VariantId};

use crate::db::orders::{self, NewOrderItem};
use crate::db::{RepositoryError, catalog, points, profiles};
use crate::models::catalog::catalog_maps;
use crate::models::order::short_id;
use crate::models::{Order, Profile, ShippingAddress};
use crate::services::catalog::cart_ids;

/// Reasons an order cannot be placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("cart contains unavailable items")]
    UnavailableItems,

    #[error("shipping address is incomplete")]
    IncompleteAddress,

    #[error("insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: Points, required: Points },

    #[error("insufficient inventory for {0}")]
    InsufficientInventory(String),

    #[error("quantity too large for {0}")]
    QuantityTooLarge(String),

    #[error("profile not found")]
    ProfileNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl CheckoutError {
    /// Message shown on the checkout page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::UnavailableItems => {
                "Some items in your cart are no longer available. Remove them to continue."
                    .to_string()
            }
            Self::IncompleteAddress => {
                "Please complete your shipping address before placing an order.".to_string()
            }
            Self::InsufficientPoints { balance, required } => format!(
                "This order needs {required} points but your balance is {balance}."
            ),
            Self::InsufficientInventory(name) => {
                format!("Not enough stock left for {name}. Lower the quantity and try again.")
            }
            Self::QuantityTooLarge(name) => {
                format!("The quantity for {name} is too large. Lower it and try again.")
            }
            Self::ProfileNotFound | Self::Repository(_) => {
                "Something went wrong placing your order. Please try again.".to_string()
            }
        }
    }

    /// Whether this is a server-side failure rather than a problem with the cart.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::ProfileNotFound | Self::Repository(_))
    }
}

/// A committed order.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<NewOrderItem>,
    pub profile: Profile,
    pub shipping: ShippingAddress,
}

/// Check a priced cart before placing it.
///
/// Lines referencing a variant that no longer exists count as unavailable.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_cart(cart: &EnrichedCart) -> Result<(), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let variant_missing =
        |line: &EnrichedLine| line.item.variant_id.is_some() && line.variant_name.is_none();
    if cart.has_unavailable() || cart.lines.iter().any(variant_missing) {
        return Err(CheckoutError::UnavailableItems);
    }
    for line in &cart.lines {
        stored_quantity(line)?;
    }
    Ok(())
}

/// The line quantity as stored in `order_items`.
fn stored_quantity(line: &EnrichedLine) -> Result<i32, CheckoutError> {
    i32::try_from(line.item.quantity).map_err(|_| CheckoutError::QuantityTooLarge(line_label(line)))
}

/// Check locked stock levels against the cart.
///
/// # Errors
///
/// Returns `InsufficientInventory` naming the first short line.
pub fn check_inventory(
    cart: &EnrichedCart,
    stock: &HashMap<VariantId, i32>,
) -> Result<(), CheckoutError> {
    for line in &cart.lines {
        let Some(variant_id) = line.item.variant_id else {
            continue;
        };
        let available = stock.get(&variant_id).copied().unwrap_or(0);
        if i64::from(available) < i64::from(line.item.quantity) {
            return Err(CheckoutError::InsufficientInventory(line_label(line)));
        }
    }
    Ok(())
}

fn line_label(line: &EnrichedLine) -> String {
    match &line.variant_name {
        Some(variant) => format!("{} ({variant})", line.product_name),
        None => line.product_name.clone(),
    }
}

fn order_items(cart: &EnrichedCart) -> Result<Vec<NewOrderItem>, CheckoutError> {
    cart.lines
        .iter()
        .map(|line| {
            Ok(NewOrderItem {
                product_id: line.item.product_id,
                variant_id: line.item.variant_id,
                product_name: line.product_name.clone(),
                variant_name: line.variant_name.clone(),
                quantity: stored_quantity(line)?,
                points_per_unit: line.unit_points,
                total_points: line.total_points,
            })
        })
        .collect()
}

/// Place an order for the cart.
///
/// On success the order, its lines, one ledger debit linked to the order
/// and the inventory decrements are committed together. The caller clears
/// the cart and sends notifications.
///
/// # Errors
///
/// Returns a `CheckoutError`; nothing is written unless the whole order
/// commits.
pub async fn place_order(
    pool: &PgPool,
    rate: ConversionRate,
    user_id: UserId,
    cart: &Cart,
) -> Result<PlacedOrder, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut tx = pool.begin().await?;

    let profile = profiles::lock_profile(&mut tx, user_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(CheckoutError::ProfileNotFound)?;

    let (product_ids, variant_ids) = cart_ids(cart);
    let (products, variants) = catalog::load_for_cart(&mut tx, &product_ids, &variant_ids).await?;
    let (products, variants) = catalog_maps(&products, &variants);
    let enriched = enrich_cart(cart, &products, &variants, rate);
    validate_cart(&enriched)?;

    let shipping = profile.shipping_address().trimmed();
    if !shipping.is_complete() {
        return Err(CheckoutError::IncompleteAddress);
    }

    let balance = points::balance(&mut tx, user_id).await?;
    if balance < enriched.total_points {
        return Err(CheckoutError::InsufficientPoints {
            balance,
            required: enriched.total_points,
        });
    }

    let stock: HashMap<VariantId, i32> = orders::lock_inventory(&mut tx, &variant_ids)
        .await?
        .into_iter()
        .collect();
    check_inventory(&enriched, &stock)?;

    let items = order_items(&enriched)?;
    let order = orders::insert_order(&mut tx, user_id, enriched.total_points, &shipping).await?;
    orders::insert_items(&mut tx, order.id, &items).await?;
    points::append(
        &mut tx,
        user_id,
        -enriched.total_points,
        &format!("Order #{}", short_id(order.id)),
        Some(order.id),
    )
    .await?;
    for item in &items {
        if let Some(variant_id) = item.variant_id {
            orders::decrement_inventory(&mut tx, variant_id, item.quantity)
                .await
                .map_err(|e| match e {
                    RepositoryError::Conflict(_) => {
                        CheckoutError::InsufficientInventory(item.product_name.clone())
                    }
                    other => CheckoutError::Repository(other),
                })?;
        }
    }

    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user_id,
        total_points = %enriched.total_points,
        "Order placed"
    );

    Ok(PlacedOrder {
        order,
        items,
        profile,
        shipping,
    })
}
