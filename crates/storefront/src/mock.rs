//! Fixed data served in dev mode (no `DATABASE_URL`).

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use perkshop_core::{
    Email, LedgerEntryId, Points, ProductId, UserId, UserRole, VariantId, mock_uuid,
};

use crate::models::{CurrentUser, LedgerEntry, Product, Profile, Variant};

/// Balance shown to the mock employee.
pub const MOCK_BALANCE: Points = Points::new(50_000);

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

fn product(n: u128, name: &str, description: &str, price: i64, category: &str) -> Product {
    Product {
        id: ProductId::from_uuid(mock_uuid(n)),
        name: name.to_string(),
        description: description.to_string(),
        base_price: Decimal::new(price, 2),
        image_url: None,
        category: Some(category.to_string()),
        is_active: true,
        created_at: epoch(),
    }
}

fn variant(n: u128, product: u128, name: &str, adjustment: i64, inventory: i32) -> Variant {
    Variant {
        id: VariantId::from_uuid(mock_uuid(n)),
        product_id: ProductId::from_uuid(mock_uuid(product)),
        name: name.to_string(),
        sku: None,
        price_adjustment: Decimal::new(adjustment, 2),
        inventory,
    }
}

/// Active mock products, by name.
#[must_use]
pub fn products() -> Vec<Product> {
    vec![
        product(3, "Enamel Pin Set", "Three enamel pins.", 800, "Accessories"),
        product(1, "Insulated Tumbler", "Keeps coffee hot for hours.", 2_500, "Drinkware"),
        product(2, "Logo Hoodie", "Heavyweight fleece hoodie.", 4_500, "Apparel"),
    ]
}

/// Variants of the mock products.
#[must_use]
pub fn variants() -> Vec<Variant> {
    vec![
        variant(101, 1, "Black", 0, 40),
        variant(102, 1, "Steel", 200, 12),
        variant(201, 2, "M", 0, 25),
        variant(202, 2, "XXL", 300, 3),
    ]
}

/// The employee every dev-mode login becomes.
#[must_use]
pub fn user(email: Email) -> CurrentUser {
    CurrentUser {
        id: UserId::from_uuid(mock_uuid(9_000)),
        email,
        full_name: "Dev Employee".to_string(),
    }
}

/// Profile of the mock employee.
#[must_use]
pub fn profile(user: &CurrentUser) -> Profile {
    Profile {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: UserRole::User,
        is_active: true,
        password_hash: None,
        address_line1: Some("1 Dev Street".to_string()),
        address_line2: None,
        city: Some("Springfield".to_string()),
        state: Some("OR".to_string()),
        postal_code: Some("97477".to_string()),
        country: Some("US".to_string()),
        phone: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

/// Ledger history of the mock employee.
#[must_use]
pub fn ledger(user_id: UserId) -> Vec<LedgerEntry> {
    vec![LedgerEntry {
        id: LedgerEntryId::from_uuid(mock_uuid(9_001)),
        user_id,
        delta: MOCK_BALANCE,
        reason: "Welcome bonus".to_string(),
        order_id: None,
        created_at: epoch(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_belong_to_products() {
        let products = products();
        for variant in variants() {
            assert!(products.iter().any(|p| p.id == variant.product_id));
        }
    }

    #[test]
    fn test_ledger_sums_to_balance() {
        let total: Points = ledger(UserId::from_uuid(mock_uuid(1)))
            .iter()
            .map(|entry| entry.delta)
            .sum();
        assert_eq!(total, MOCK_BALANCE);
    }
}
