//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use perkshop_core::reporting::PointsSummary;

use super::{AdminUserView, render};
use crate::db::{
    AccessRequestRepository, LedgerRepository, OrderRepository, ProductRepository, UserRepository,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::OrderSummary;
use crate::state::AppState;

/// Headline counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardCounts {
    pub products: i64,
    pub users: i64,
    pub pending_orders: i64,
    pub pending_requests: i64,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub dev_mode: bool,
    pub counts: DashboardCounts,
    pub points: PointsSummary,
    pub recent_orders: Vec<OrderSummary>,
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let (counts, points, recent_orders) = match state.pool() {
        Some(pool) => {
            let products = ProductRepository::new(pool);
            let users = UserRepository::new(pool);
            let orders = OrderRepository::new(pool);
            let requests = AccessRequestRepository::new(pool);
            let ledger = LedgerRepository::new(pool);

            let (product_count, user_count, pending_orders, pending_requests, deltas, recent) =
                tokio::join!(
                    products.count_active(),
                    users.count_active(),
                    orders.count_pending(),
                    requests.count_pending(),
                    ledger.all_deltas(),
                    orders.list(None, 5),
                );

            let counts = DashboardCounts {
                products: product_count?,
                users: user_count?,
                pending_orders: pending_orders?,
                pending_requests: pending_requests?,
            };
            (counts, PointsSummary::from_deltas(deltas?), recent?)
        }
        None => (DashboardCounts::default(), PointsSummary::default(), Vec::new()),
    };

    Ok(render(&DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        dev_mode: state.is_dev_mode(),
        counts,
        points,
        recent_orders,
    }))
}
