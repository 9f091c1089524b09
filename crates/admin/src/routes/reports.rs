//! Points and order aggregates.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use perkshop_core::Points;
use perkshop_core::reporting::{PointsSummary, TopProduct, average_order_value, top_products};

use super::{AdminUserView, render};
use crate::db::{LedgerRepository, ReportRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Products listed under "top products".
const TOP_PRODUCT_COUNT: usize = 5;

/// Reports template.
#[derive(Template)]
#[template(path = "reports/index.html")]
pub struct ReportsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub points: PointsSummary,
    pub order_count: usize,
    pub average_order: Points,
    pub top_products: Vec<TopProduct>,
}

/// Reports page handler.
///
/// GET /reports
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let pool = state.db()?;
    let reports = ReportRepository::new(pool);
    let ledger = LedgerRepository::new(pool);

    let (deltas, totals, sold) = tokio::join!(
        ledger.all_deltas(),
        reports.order_totals(),
        reports.sold_items()
    );
    let totals = totals?;

    Ok(render(&ReportsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/reports".to_string(),
        points: PointsSummary::from_deltas(deltas?),
        order_count: totals.len(),
        average_order: average_order_value(&totals),
        top_products: top_products(&sold?, TOP_PRODUCT_COUNT),
    }))
}
