//! Catalog queries.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use perkshop_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::{Product, Variant};

const PRODUCT_COLUMNS: &str =
    "id, name, description, base_price, image_url, category, is_active, created_at";
const VARIANT_COLUMNS: &str = "id, product_id, name, sku, price_adjustment, inventory";

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// An active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Variants of a product, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for(&self, product_id: ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let variants = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY name"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(variants)
    }

    /// Active products and their variants referenced by a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn load_for_cart(
        &self,
        product_ids: &[ProductId],
        variant_ids: &[VariantId],
    ) -> Result<(Vec<Product>, Vec<Variant>), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_for_cart(&mut conn, product_ids, variant_ids).await
    }
}

/// Cart catalog lookup, usable inside a transaction.
pub(crate) async fn load_for_cart(
    conn: &mut PgConnection,
    product_ids: &[ProductId],
    variant_ids: &[VariantId],
) -> Result<(Vec<Product>, Vec<Variant>), RepositoryError> {
    let product_uuids: Vec<Uuid> = product_ids.iter().map(ProductId::as_uuid).collect();
    let variant_uuids: Vec<Uuid> = variant_ids.iter().map(VariantId::as_uuid).collect();

    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) AND is_active"
    ))
    .bind(&product_uuids)
    .fetch_all(&mut *conn)
    .await?;

    let variants = sqlx::query_as::<_, Variant>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ANY($1)"
    ))
    .bind(&variant_uuids)
    .fetch_all(&mut *conn)
    .await?;

    Ok((products, variants))
}
