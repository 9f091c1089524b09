//! Joining cart lines against catalog data.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::{Cart, CartItem};
use crate::{ConversionRate, Points, ProductId, VariantId};

/// Display name used for lines whose product no longer exists.
pub const UNAVAILABLE_PRODUCT_NAME: &str = "Unavailable product";

/// Product fields needed to price a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    /// List price in USD.
    pub base_price: Decimal,
    pub image_url: Option<String>,
}

/// Variant fields needed to price a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    /// USD added to (or subtracted from) the product's base price.
    pub price_adjustment: Decimal,
    pub inventory: i32,
}

/// A cart line with names and point prices attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedLine {
    pub item: CartItem,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub image_url: Option<String>,
    pub unit_points: Points,
    pub total_points: Points,
    /// `false` when the product could not be found.
    pub available: bool,
    /// Variant stock, when the line references a known variant.
    pub inventory: Option<i32>,
}

impl EnrichedLine {
    /// Whether the referenced variant has fewer units than requested.
    #[must_use]
    pub fn exceeds_inventory(&self) -> bool {
        self.inventory
            .is_some_and(|stock| i64::from(stock) < i64::from(self.item.quantity))
    }
}

/// A fully priced cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichedCart {
    pub lines: Vec<EnrichedLine>,
    pub total_points: Points,
    pub total_quantity: u64,
}

impl EnrichedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line references a missing product.
    #[must_use]
    pub fn has_unavailable(&self) -> bool {
        self.lines.iter().any(|line| !line.available)
    }
}

/// Price every cart line.
///
/// Base price and variant adjustment are converted and rounded separately;
/// line and cart totals are sums of those rounded values. Missing products
/// become zero-point placeholder lines instead of errors, and a missing
/// variant contributes no adjustment.
#[must_use]
pub fn enrich_cart<S: std::hash::BuildHasher>(
    cart: &Cart,
    products: &HashMap<ProductId, CatalogProduct, S>,
    variants: &HashMap<VariantId, CatalogVariant, S>,
    rate: ConversionRate,
) -> EnrichedCart {
    let lines: Vec<EnrichedLine> = cart
        .items
        .iter()
        .map(|item| enrich_line(item, products, variants, rate))
        .collect();

    EnrichedCart {
        total_points: lines.iter().map(|line| line.total_points).sum(),
        total_quantity: lines.iter().map(|line| u64::from(line.item.quantity)).sum(),
        lines,
    }
}

fn enrich_line<S: std::hash::BuildHasher>(
    item: &CartItem,
    products: &HashMap<ProductId, CatalogProduct, S>,
    variants: &HashMap<VariantId, CatalogVariant, S>,
    rate: ConversionRate,
) -> EnrichedLine {
    let Some(product) = products.get(&item.product_id) else {
        return EnrichedLine {
            item: item.clone(),
            product_name: UNAVAILABLE_PRODUCT_NAME.to_string(),
            variant_name: None,
            image_url: None,
            unit_points: Points::ZERO,
            total_points: Points::ZERO,
            available: false,
            inventory: None,
        };
    };

    let variant = item
        .variant_id
        .and_then(|id| variants.get(&id))
        .filter(|variant| variant.product_id == product.id);

    let mut unit_points = rate.to_points(product.base_price);
    if let Some(variant) = variant {
        unit_points += rate.to_points(variant.price_adjustment);
    }

    EnrichedLine {
        item: item.clone(),
        product_name: product.name.clone(),
        variant_name: variant.map(|v| v.name.clone()),
        image_url: product.image_url.clone(),
        unit_points,
        total_points: unit_points * item.quantity,
        available: true,
        inventory: variant.map(|v| v.inventory),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartStore, MemoryStorage};
    use crate::mock_uuid;

    fn catalog() -> (
        HashMap<ProductId, CatalogProduct>,
        HashMap<VariantId, CatalogVariant>,
    ) {
        let hoodie = ProductId::from_uuid(mock_uuid(1));
        let products = HashMap::from([(
            hoodie,
            CatalogProduct {
                id: hoodie,
                name: "Team Hoodie".to_string(),
                base_price: Decimal::new(25, 0),
                image_url: None,
            },
        )]);
        let xl = VariantId::from_uuid(mock_uuid(11));
        let variants = HashMap::from([(
            xl,
            CatalogVariant {
                id: xl,
                product_id: hoodie,
                name: "XL".to_string(),
                price_adjustment: Decimal::new(2_005, 3),
                inventory: 2,
            },
        )]);
        (products, variants)
    }

    #[test]
    fn test_base_price_times_quantity() {
        let (products, variants) = catalog();
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(ProductId::from_uuid(mock_uuid(1)), None, 3);

        let enriched = enrich_cart(&store.get(), &products, &variants, ConversionRate::DEFAULT);
        assert_eq!(enriched.lines[0].unit_points, Points::new(2500));
        assert_eq!(enriched.total_points, Points::new(7500));
        assert_eq!(enriched.total_quantity, 3);
    }

    #[test]
    fn test_variant_adjustment_rounded_separately() {
        let (products, variants) = catalog();
        let mut store = CartStore::new(MemoryStorage::new());
        let xl = VariantId::from_uuid(mock_uuid(11));
        store.add(ProductId::from_uuid(mock_uuid(1)), Some(xl), 3);

        let enriched = enrich_cart(&store.get(), &products, &variants, ConversionRate::DEFAULT);
        let line = &enriched.lines[0];
        // 2500 + round(200.5) = 2701 per unit.
        assert_eq!(line.unit_points, Points::new(2701));
        assert_eq!(line.total_points, Points::new(8103));
        assert_eq!(line.variant_name.as_deref(), Some("XL"));
        assert!(line.exceeds_inventory());
    }

    #[test]
    fn test_unknown_product_is_zero_point_placeholder() {
        let (products, variants) = catalog();
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(ProductId::from_uuid(mock_uuid(99)), None, 4);
        store.add(ProductId::from_uuid(mock_uuid(1)), None, 1);

        let enriched = enrich_cart(&store.get(), &products, &variants, ConversionRate::DEFAULT);
        let placeholder = &enriched.lines[0];
        assert!(!placeholder.available);
        assert_eq!(placeholder.product_name, UNAVAILABLE_PRODUCT_NAME);
        assert_eq!(placeholder.total_points, Points::ZERO);
        assert!(enriched.has_unavailable());
        assert_eq!(enriched.total_points, Points::new(2500));
        assert_eq!(enriched.total_quantity, 5);
    }

    #[test]
    fn test_unknown_variant_adds_nothing() {
        let (products, variants) = catalog();
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(
            ProductId::from_uuid(mock_uuid(1)),
            Some(VariantId::from_uuid(mock_uuid(404))),
            1,
        );

        let enriched = enrich_cart(&store.get(), &products, &variants, ConversionRate::DEFAULT);
        assert!(enriched.lines[0].available);
        assert_eq!(enriched.lines[0].unit_points, Points::new(2500));
        assert!(enriched.lines[0].variant_name.is_none());
    }
}
