//! Order fulfilment route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::tracking::{TrackingLink, tracking_link};
use perkshop_core::{OrderId, OrderStatus};

use super::{AdminUserView, render};
use crate::db::orders::StatusChange;
use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Order, OrderItem, OrderSummary, UserSummary};
use crate::services::ShippedEmail;
use crate::state::AppState;

/// Orders shown on the list page.
const ORDER_LIST_LIMIT: i64 = 200;

/// Orders list query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    #[serde(default)]
    pub tracking_number: String,
}

/// Orders list template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub orders: Vec<OrderSummary>,
    pub statuses: &'static [OrderStatus],
    pub status_filter: Option<OrderStatus>,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub employee: Option<UserSummary>,
    pub tracking: Option<TrackingLink>,
    pub statuses: &'static [OrderStatus],
}

/// Parse an optional status filter. Blank means all.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("unknown status '{s}'"))),
        None => Ok(None),
    }
}

/// Orders list page handler.
///
/// GET /orders
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Html<String>> {
    let status_filter = parse_status_filter(query.status.as_deref())?;
    let orders = OrderRepository::new(state.db()?)
        .list(status_filter, ORDER_LIST_LIMIT)
        .await?;

    Ok(render(&OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        orders,
        statuses: OrderStatus::ALL,
        status_filter,
    }))
}

/// Order detail page handler.
///
/// GET /orders/{id}
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Html<String>> {
    let pool = state.db()?;
    let orders = OrderRepository::new(pool);
    let order = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    let users = UserRepository::new(pool);
    let (items, employee) = tokio::join!(orders.items(id), users.get(order.user_id));

    Ok(render(&OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        tracking: order.tracking_number.as_deref().and_then(tracking_link),
        order,
        items: items?,
        employee: employee?,
        statuses: OrderStatus::ALL,
    }))
}

/// Change an order's status and tracking number.
///
/// POST /orders/{id}/status
#[instrument(skip(admin, state))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let pool = state.db()?;
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown status '{}'", form.status)))?;
    let tracking = Some(form.tracking_number.trim()).filter(|t| !t.is_empty());

    let change = OrderRepository::new(pool)
        .update_status(id, status, tracking)
        .await?;

    tracing::info!(
        order_id = %id,
        from = %change.previous,
        to = %change.order.status,
        refunded = ?change.refunded.map(|p| p.value()),
        admin_id = %admin.id,
        "Order status changed"
    );

    if change.newly_shipped() {
        notify_shipped(&state, &change).await;
    }

    Ok(Redirect::to(&format!("/orders/{id}")))
}

/// Email the employee a shipping notice in the background.
async fn notify_shipped(state: &AppState, change: &StatusChange) {
    let (Some(email), Some(pool)) = (state.email().cloned(), state.pool()) else {
        return;
    };

    let employee = match UserRepository::new(pool).get(change.order.user_id).await {
        Ok(Some(employee)) => employee,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load employee for shipping notice");
            return;
        }
    };

    let notice = ShippedEmail {
        short_id: change.order.short_id(),
        employee_name: employee.full_name,
        employee_email: employee.email,
        tracking: change.order.tracking_number.as_deref().and_then(tracking_link),
        order_url: format!(
            "{}/orders/{}",
            state.config().storefront_base_url.trim_end_matches('/'),
            change.order.id
        ),
    };

    tokio::spawn(async move {
        if let Err(e) = email.send_order_shipped(&notice).await {
            tracing::warn!(error = %e, "Failed to send shipping notice");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_filter() {
        assert_eq!(parse_status_filter(None).ok(), Some(None));
        assert_eq!(parse_status_filter(Some("  ")).ok(), Some(None));
        assert_eq!(
            parse_status_filter(Some("shipped")).ok(),
            Some(Some(OrderStatus::Shipped))
        );
        assert!(parse_status_filter(Some("lost")).is_err());
    }
}
