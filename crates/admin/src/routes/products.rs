//! Product and variant management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::{Points, ProductId, VariantId};

use super::{AdminUserView, render};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::catalog::{ProductForm, VariantForm};
use crate::models::{Product, Variant};
use crate::state::AppState;

/// Product row for the list page.
pub struct ProductRow {
    pub product: Product,
    pub points: Points,
}

/// Product list template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub products: Vec<ProductRow>,
}

/// New product template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub form: ProductForm,
    pub error: Option<String>,
}

/// Edit product template, with variants.
#[derive(Template)]
#[template(path = "products/edit.html")]
pub struct ProductEditTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub product: Product,
    pub points: Points,
    pub form: ProductForm,
    pub variants: Vec<Variant>,
    pub error: Option<String>,
}

/// Error carried back to the edit page after a failed variant change.
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub error: Option<String>,
}

fn edit_url(id: ProductId) -> String {
    format!("/products/{id}")
}

fn edit_url_with_error(id: ProductId, error: &str) -> String {
    format!("/products/{id}?error={}", urlencoding::encode(error))
}

/// List all products, inactive included.
///
/// GET /products
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Response> {
    let rate = state.rate();
    let products = ProductRepository::new(state.db()?)
        .list()
        .await?
        .into_iter()
        .map(|product| ProductRow {
            points: product.points(rate),
            product,
        })
        .collect();

    Ok(render(&ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        products,
    })
    .into_response())
}

/// New product form.
///
/// GET /products/new
#[instrument(skip(admin))]
pub async fn new_page(RequireAdminAuth(admin): RequireAdminAuth) -> Response {
    render(&ProductFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        form: ProductForm::default(),
        error: None,
    })
    .into_response()
}

/// Create a product.
///
/// POST /products
#[instrument(skip(admin, state, form))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let pool = state.db()?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(error) => {
            let page = render(&ProductFormTemplate {
                admin_user: AdminUserView::from(&admin),
                current_path: "/products".to_string(),
                form,
                error: Some(error),
            });
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let product = ProductRepository::new(pool).create(&input).await?;
    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product created");

    Ok(Redirect::to(&edit_url(product.id)).into_response())
}

/// Edit page for one product.
///
/// GET /products/{id}
#[instrument(skip(admin, state, query))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<EditQuery>,
) -> Result<Response> {
    let repo = ProductRepository::new(state.db()?);
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let variants = repo.variants(id).await?;

    Ok(render(&ProductEditTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        points: product.points(state.rate()),
        form: ProductForm::from(&product),
        product,
        variants,
        error: query.error,
    })
    .into_response())
}

/// Update a product.
///
/// POST /products/{id}
#[instrument(skip(admin, state, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let repo = ProductRepository::new(state.db()?);
    let input = match form.validate() {
        Ok(input) => input,
        Err(error) => {
            let product = repo
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
            let variants = repo.variants(id).await?;
            let page = render(&ProductEditTemplate {
                admin_user: AdminUserView::from(&admin),
                current_path: "/products".to_string(),
                points: product.points(state.rate()),
                form,
                product,
                variants,
                error: Some(error),
            });
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    repo.update(id, &input).await?;
    tracing::info!(product_id = %id, admin_id = %admin.id, "Product updated");

    Ok(Redirect::to(&edit_url(id)).into_response())
}

/// Activate or deactivate a product.
///
/// POST /products/{id}/toggle
#[instrument(skip(admin, state))]
pub async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let active = ProductRepository::new(state.db()?).toggle_active(id).await?;
    tracing::info!(product_id = %id, active, admin_id = %admin.id, "Product toggled");

    Ok(Redirect::to("/products"))
}

/// Add a variant.
///
/// POST /products/{id}/variants
#[instrument(skip(admin, state, form))]
pub async fn add_variant(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Form(form): Form<VariantForm>,
) -> Result<Redirect> {
    let repo = ProductRepository::new(state.db()?);
    let input = match form.validate() {
        Ok(input) => input,
        Err(error) => return Ok(Redirect::to(&edit_url_with_error(id, &error))),
    };

    let variant = repo.add_variant(id, &input).await?;
    tracing::info!(product_id = %id, variant_id = %variant.id, admin_id = %admin.id, "Variant added");

    Ok(Redirect::to(&edit_url(id)))
}

/// Update a variant's name, price adjustment and inventory.
///
/// POST /products/{id}/variants/{variant_id}
#[instrument(skip(admin, state, form))]
pub async fn update_variant(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path((id, variant_id)): Path<(ProductId, VariantId)>,
    Form(form): Form<VariantForm>,
) -> Result<Redirect> {
    let repo = ProductRepository::new(state.db()?);
    let input = match form.validate() {
        Ok(input) => input,
        Err(error) => return Ok(Redirect::to(&edit_url_with_error(id, &error))),
    };

    repo.update_variant(id, variant_id, &input).await?;
    tracing::info!(product_id = %id, %variant_id, admin_id = %admin.id, "Variant updated");

    Ok(Redirect::to(&edit_url(id)))
}

/// Delete a variant.
///
/// POST /products/{id}/variants/{variant_id}/delete
#[instrument(skip(admin, state))]
pub async fn delete_variant(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path((id, variant_id)): Path<(ProductId, VariantId)>,
) -> Result<Redirect> {
    ProductRepository::new(state.db()?)
        .delete_variant(id, variant_id)
        .await?;
    tracing::info!(product_id = %id, %variant_id, admin_id = %admin.id, "Variant deleted");

    Ok(Redirect::to(&edit_url(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_url_with_error_is_encoded() {
        let id = ProductId::from_uuid(uuid::Uuid::nil());
        assert_eq!(
            edit_url_with_error(id, "name is required & more"),
            "/products/00000000-0000-0000-0000-000000000000?error=name%20is%20required%20%26%20more"
        );
    }
}
