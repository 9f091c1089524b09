//! Catalog row types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use perkshop_core::cart::{CatalogProduct, CatalogVariant};
use perkshop_core::{ProductId, VariantId};

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
}

impl Product {
    /// Pricing view used by cart enrichment.
    #[must_use]
    pub fn to_catalog(&self) -> CatalogProduct {
        CatalogProduct {
            id: self.id,
            name: self.name.clone(),
            base_price: self.base_price,
            image_url: self.image_url.clone(),
        }
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

impl Variant {
    /// Pricing view used by cart enrichment.
    #[must_use]
    pub fn to_catalog(&self) -> CatalogVariant {
        CatalogVariant {
            id: self.id,
            product_id: self.product_id,
            name: self.name.clone(),
            price_adjustment: self.price_adjustment,
            inventory: self.inventory,
        }
    }
}

/// Lookup maps for enrichment.
pub type CatalogMaps = (
    HashMap<ProductId, CatalogProduct>,
    HashMap<VariantId, CatalogVariant>,
);

/// Index products and variants by ID.
#[must_use]
pub fn catalog_maps(products: &[Product], variants: &[Variant]) -> CatalogMaps {
    (
        products.iter().map(|p| (p.id, p.to_catalog())).collect(),
        variants.iter().map(|v| (v.id, v.to_catalog())).collect(),
    )
}
