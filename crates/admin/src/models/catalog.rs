//! Product and variant rows, including inactive products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use perkshop_core::{ConversionRate, Points, ProductId, VariantId};

/// A product row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Base price in points.
    #[must_use]
    pub fn points(&self, rate: ConversionRate) -> Points {
        rate.to_points(self.base_price)
    }
}

/// A product variant row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    pub price_adjustment: Decimal,
    pub inventory: i32,
}

/// Product create/edit form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            base_price: product.base_price.to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
        }
    }
}

/// A validated product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

impl ProductForm {
    /// Trim fields and parse the price.
    ///
    /// # Errors
    ///
    /// Returns a message for a blank name or a missing, malformed, or
    /// negative price.
    pub fn validate(&self) -> Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required.".to_string());
        }
        let base_price = self
            .base_price
            .trim()
            .trim_start_matches('$')
            .parse::<Decimal>()
            .map_err(|_| "Price must be a dollar amount, e.g. 24.99.".to_string())?;
        if base_price.is_sign_negative() {
            return Err("Price cannot be negative.".to_string());
        }
        Ok(ProductInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            base_price: base_price.round_dp(2),
            image_url: non_empty(&self.image_url),
            category: non_empty(&self.category),
        })
    }
}

/// Variant add/update form.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantForm {
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price_adjustment: String,
    #[serde(default)]
    pub inventory: String,
}

/// A validated variant form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInput {
    pub name: String,
    pub sku: Option<String>,
    pub price_adjustment: Decimal,
    pub inventory: i32,
}

impl VariantForm {
    /// Trim fields and parse the numbers. Blank adjustment and inventory
    /// mean zero.
    ///
    /// # Errors
    ///
    /// Returns a message for a blank name, a malformed adjustment, or
    /// negative or malformed inventory.
    pub fn validate(&self) -> Result<VariantInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Variant name is required.".to_string());
        }
        let price_adjustment = match self.price_adjustment.trim() {
            "" => Decimal::ZERO,
            raw => raw
                .parse::<Decimal>()
                .map_err(|_| "Price adjustment must be a dollar amount.".to_string())?,
        };
        let inventory = match self.inventory.trim() {
            "" => 0,
            raw => raw
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| "Inventory must be a whole number, zero or more.".to_string())?,
        };
        Ok(VariantInput {
            name: name.to_string(),
            sku: non_empty(&self.sku),
            price_adjustment: price_adjustment.round_dp(2),
            inventory,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn product_form(price: &str) -> ProductForm {
        ProductForm {
            name: " Hoodie ".to_string(),
            base_price: price.to_string(),
            category: "  ".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_product_form_trims_and_rounds() {
        let input = product_form("$45.005").validate().unwrap();
        assert_eq!(input.name, "Hoodie");
        assert_eq!(input.base_price, Decimal::from_str("45.00").unwrap());
        assert!(input.category.is_none());
    }

    #[test]
    fn test_product_form_rejects_bad_price() {
        assert!(product_form("abc").validate().is_err());
        assert!(product_form("-1").validate().is_err());
        assert!(product_form("").validate().is_err());
    }

    #[test]
    fn test_variant_form_defaults() {
        let input = VariantForm {
            name: "XL".to_string(),
            sku: String::new(),
            price_adjustment: String::new(),
            inventory: " ".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(input.price_adjustment, Decimal::ZERO);
        assert_eq!(input.inventory, 0);
        assert!(input.sku.is_none());
    }

    #[test]
    fn test_variant_form_rejects_negative_inventory() {
        let form = VariantForm {
            name: "XL".to_string(),
            sku: String::new(),
            price_adjustment: "-2.50".to_string(),
            inventory: "-1".to_string(),
        };
        assert!(form.validate().is_err());
    }
}
