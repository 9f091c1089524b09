//! Order history route handlers.
//!
//! These routes require authentication. Employees only ever see their own
//! orders; another employee's order ID is a 404.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::OrderId;
use perkshop_core::tracking::{TrackingLink, tracking_link};

use super::Nav;
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderItem};
use crate::state::AppState;

/// Query parameters after checkout.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub placed: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub nav: Nav,
    pub orders: Vec<Order>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub nav: Nav,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Option<TrackingLink>,
    pub placed: bool,
}

/// Display the employee's orders, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = match state.pool() {
        Some(pool) => OrderRepository::new(pool).list_for_user(user.id).await?,
        None => Vec::new(),
    };

    Ok(OrdersIndexTemplate {
        nav: Nav::new(&state, Some(&user)),
        orders,
    })
}

/// Display one order with its lines and tracking link.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("order {id}"));
    let pool = state.pool().ok_or_else(not_found)?;
    let repo = OrderRepository::new(pool);

    let order = repo
        .get_for_user(id, user.id)
        .await?
        .ok_or_else(not_found)?;
    let items = repo.items(order.id).await?;
    let tracking = order.tracking_number.as_deref().and_then(tracking_link);

    Ok(OrderShowTemplate {
        nav: Nav::new(&state, Some(&user)),
        order,
        items,
        tracking,
        placed: query.placed.is_some(),
    })
}
