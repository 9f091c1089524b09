//! Product and variant management.

use sqlx::PgPool;

use perkshop_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::catalog::{ProductInput, VariantInput};
use crate::models::{Product, Variant};

const PRODUCT_COLUMNS: &str =
    "id, name, description, base_price, image_url, category, is_active, created_at, updated_at";
const VARIANT_COLUMNS: &str = "id, product_id, name, sku, price_adjustment, inventory";

/// Repository for catalog writes, including inactive products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, active first, then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY is_active DESC, name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Number of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Create an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (name, description, base_price, image_url, category)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.base_price)
        .bind(&input.image_url)
        .bind(&input.category)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products
            SET name = $2, description = $3, base_price = $4, image_url = $5, category = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.base_price)
        .bind(&input.image_url)
        .bind(&input.category)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Flip a product's active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn toggle_active(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let row: Option<(bool,)> = sqlx::query_as(
            r"
            UPDATE products SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.map(|(active,)| active).ok_or(RepositoryError::NotFound)
    }

    /// Variants of a product, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants(&self, product_id: ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let variants = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY created_at, name"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(variants)
    }

    /// Add a variant to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add_variant(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            r"
            INSERT INTO product_variants (product_id, name, sku, price_adjustment, inventory)
            SELECT id, $2, $3, $4, $5 FROM products WHERE id = $1
            RETURNING {VARIANT_COLUMNS}
            "
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(input.price_adjustment)
        .bind(input.inventory)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Update a variant's name, SKU, price adjustment and inventory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not belong to
    /// the product.
    pub async fn update_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        sqlx::query_as::<_, Variant>(&format!(
            r"
            UPDATE product_variants
            SET name = $3, sku = $4, price_adjustment = $5, inventory = $6
            WHERE id = $2 AND product_id = $1
            RETURNING {VARIANT_COLUMNS}
            "
        ))
        .bind(product_id)
        .bind(variant_id)
        .bind(&input.name)
        .bind(&input.sku)
        .bind(input.price_adjustment)
        .bind(input.inventory)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a variant. Past order lines keep their name snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not belong to
    /// the product.
    pub async fn delete_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM product_variants WHERE id = $2 AND product_id = $1")
                .bind(product_id)
                .bind(variant_id)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
