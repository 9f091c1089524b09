//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::{ConversionRate, Points, ProductId};

use super::Nav;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Product, Variant};
use crate::services::catalog::{CatalogService, categories, filter_products};
use crate::state::AppState;

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// Product card display data.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub points: Points,
}

impl ProductCard {
    fn new(product: &Product, rate: ConversionRate) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            image_url: product.image_url.clone(),
            category: product.category.clone(),
            points: rate.to_points(product.base_price),
        }
    }
}

/// Variant option display data.
#[derive(Debug, Clone)]
pub struct VariantOption {
    pub id: String,
    pub name: String,
    pub points: Points,
    pub inventory: i32,
}

impl VariantOption {
    fn new(product: &Product, variant: &Variant, rate: ConversionRate) -> Self {
        Self {
            id: variant.id.to_string(),
            name: variant.name.clone(),
            points: rate.to_points(product.base_price) + rate.to_points(variant.price_adjustment),
            inventory: variant.inventory,
        }
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory > 0
    }
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub nav: Nav,
    pub products: Vec<ProductCard>,
    pub categories: Vec<String>,
    pub query: String,
    pub category: String,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/show.html")]
pub struct ProductShowTemplate {
    pub nav: Nav,
    pub product: ProductCard,
    pub variants: Vec<VariantOption>,
}

/// Display the product listing.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let all = CatalogService::new(&state).active_products().await?;
    let rate = state.rate();

    let products = filter_products(&all, query.q.as_deref(), query.category.as_deref())
        .iter()
        .map(|p| ProductCard::new(p, rate))
        .collect();

    Ok(CatalogIndexTemplate {
        nav: Nav::new(&state, user.as_ref()),
        products,
        categories: categories(&all),
        query: query.q.unwrap_or_default(),
        category: query.category.unwrap_or_default(),
    })
}

/// Display a product with its variants.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let (product, variants) = CatalogService::new(&state)
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let rate = state.rate();

    Ok(ProductShowTemplate {
        nav: Nav::new(&state, user.as_ref()),
        variants: variants
            .iter()
            .map(|v| VariantOption::new(&product, v, rate))
            .collect(),
        product: ProductCard::new(&product, rate),
    })
}
