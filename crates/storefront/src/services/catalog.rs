//! Catalog reads and cart pricing.
//!
//! The active product listing is cached for a minute; product detail pages
//! and cart pricing always read fresh rows. Dev mode serves [`crate::mock`].

use std::collections::BTreeSet;
use std::sync::Arc;

use perkshop_core::ProductId;
use perkshop_core::cart::{Cart, EnrichedCart, enrich_cart};

use crate::db::CatalogRepository;
use crate::error::AppError;
use crate::mock;
use crate::models::catalog::catalog_maps;
use crate::models::{Product, Variant};
use crate::state::AppState;

/// Catalog service.
pub struct CatalogService<'a> {
    state: &'a AppState,
}

impl<'a> CatalogService<'a> {
    /// Create a catalog service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// All active products, by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn active_products(&self) -> Result<Arc<Vec<Product>>, AppError> {
        let Some(pool) = self.state.pool() else {
            return Ok(Arc::new(mock::products()));
        };

        let cache = self.state.catalog_cache();
        if let Some(products) = cache.get(&()).await {
            return Ok(products);
        }

        let products = Arc::new(CatalogRepository::new(pool).list_active().await?);
        cache.insert((), Arc::clone(&products)).await;
        tracing::debug!(count = products.len(), "Catalog cache refreshed");
        Ok(products)
    }

    /// An active product and its variants.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<(Product, Vec<Variant>)>, AppError> {
        let Some(pool) = self.state.pool() else {
            let product = mock::products().into_iter().find(|p| p.id == id);
            return Ok(product.map(|product| {
                let variants = mock::variants()
                    .into_iter()
                    .filter(|v| v.product_id == id)
                    .collect();
                (product, variants)
            }));
        };

        let repo = CatalogRepository::new(pool);
        let Some(product) = repo.get_active(id).await? else {
            return Ok(None);
        };
        let variants = repo.variants_for(id).await?;
        Ok(Some((product, variants)))
    }

    /// Price a cart against the current catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn enrich(&self, cart: &Cart) -> Result<EnrichedCart, AppError> {
        let (products, variants) = match self.state.pool() {
            None => (mock::products(), mock::variants()),
            Some(pool) => {
                let (product_ids, variant_ids) = cart_ids(cart);
                CatalogRepository::new(pool)
                    .load_for_cart(&product_ids, &variant_ids)
                    .await?
            }
        };
        let (products, variants) = catalog_maps(&products, &variants);
        Ok(enrich_cart(cart, &products, &variants, self.state.rate()))
    }
}

/// Distinct product and variant IDs referenced by a cart.
#[must_use]
pub fn cart_ids(cart: &Cart) -> (Vec<ProductId>, Vec<perkshop_core::VariantId>) {
    let products: BTreeSet<_> = cart.items.iter().map(|item| item.product_id).collect();
    let variants: BTreeSet<_> = cart.items.iter().filter_map(|item| item.variant_id).collect();
    (products.into_iter().collect(), variants.into_iter().collect())
}

/// Filter a listing by case-insensitive name search and exact category.
#[must_use]
pub fn filter_products(products: &[Product], query: Option<&str>, category: Option<&str>) -> Vec<Product> {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);
    let category = category.map(str::trim).filter(|c| !c.is_empty());

    products
        .iter()
        .filter(|p| {
            query
                .as_deref()
                .is_none_or(|q| p.name.to_lowercase().contains(q))
        })
        .filter(|p| category.is_none_or(|c| p.category.as_deref() == Some(c)))
        .cloned()
        .collect()
}

/// Distinct categories of a listing, sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .filter_map(|p| p.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use perkshop_core::cart::CartItem;
    use perkshop_core::{VariantId, mock_uuid};

    use super::*;

    #[test]
    fn test_filter_by_name_is_case_insensitive() {
        let products = mock::products();
        let found = filter_products(&products, Some("  HOODIE "), None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Logo Hoodie");
    }

    #[test]
    fn test_filter_by_category() {
        let products = mock::products();
        let found = filter_products(&products, None, Some("Drinkware"));
        assert_eq!(found.len(), 1);
        assert!(filter_products(&products, Some("mug"), Some("Apparel")).is_empty());
        assert_eq!(filter_products(&products, Some(""), Some("")).len(), products.len());
    }

    #[test]
    fn test_categories_are_sorted_and_distinct() {
        assert_eq!(
            categories(&mock::products()),
            vec!["Accessories", "Apparel", "Drinkware"]
        );
    }

    #[test]
    fn test_cart_ids_are_distinct() {
        let p = ProductId::from_uuid(mock_uuid(1));
        let cart = Cart {
            items: vec![
                CartItem {
                    product_id: p,
                    variant_id: Some(VariantId::from_uuid(mock_uuid(101))),
                    quantity: 1,
                },
                CartItem {
                    product_id: p,
                    variant_id: None,
                    quantity: 1,
                },
            ],
        };
        let (products, variants) = cart_ids(&cart);
        assert_eq!(products, vec![p]);
        assert_eq!(variants.len(), 1);
    }
}
