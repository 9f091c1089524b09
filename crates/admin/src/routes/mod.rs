//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard
//! GET  /                                   - Counts, points summary, recent orders
//!
//! # Auth
//! GET  /auth/login                         - Login page
//! POST /auth/login                         - Password login (admins only)
//! POST /auth/logout                        - Logout
//!
//! # Products
//! GET  /products                           - All products, inactive included
//! GET  /products/new                       - New product form
//! POST /products                           - Create product
//! GET  /products/{id}                      - Edit product and its variants
//! POST /products/{id}                      - Update product
//! POST /products/{id}/toggle               - Activate / deactivate
//! POST /products/{id}/variants             - Add variant
//! POST /products/{id}/variants/{vid}       - Update variant
//! POST /products/{id}/variants/{vid}/delete - Delete variant
//!
//! # Orders
//! GET  /orders                             - Order list (?status=)
//! GET  /orders/{id}                        - Order detail
//! POST /orders/{id}/status                 - Change status and tracking number
//!
//! # Users
//! GET  /users                              - Employees with balances
//! GET  /users/{id}                         - Profile, balance, ledger
//! POST /users/{id}/points                  - Adjust points
//! POST /users/{id}/role                    - Change role
//! POST /users/{id}/toggle                  - Activate / deactivate
//!
//! # Access requests
//! GET  /access-requests                    - Pending requests
//! POST /access-requests/{id}/approve       - Approve and invite
//! POST /access-requests/{id}/deny          - Deny
//!
//! # Reports and exports
//! GET  /reports                            - Points and order aggregates
//! GET  /exports                            - Monthly export ledger
//! GET  /exports/{type}                     - Ad-hoc CSV download (?from=&to=)
//! POST /api/cron/monthly-export            - Monthly job (x-cron-secret header)
//! ```

pub mod access_requests;
pub mod auth;
pub mod cron;
pub mod dashboard;
pub mod exports;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};

use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.display_name().to_string(),
            email: admin.email.to_string(),
        }
    }
}

/// Render a full page, logging render failures.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .merge(auth::router())
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new_page))
        .route("/products/{id}", get(products::edit).post(products::update))
        .route("/products/{id}/toggle", post(products::toggle))
        .route("/products/{id}/variants", post(products::add_variant))
        .route(
            "/products/{id}/variants/{variant_id}",
            post(products::update_variant),
        )
        .route(
            "/products/{id}/variants/{variant_id}/delete",
            post(products::delete_variant),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show))
        .route("/users/{id}/points", post(users::adjust_points))
        .route("/users/{id}/role", post(users::set_role))
        .route("/users/{id}/toggle", post(users::toggle_active))
        .route("/access-requests", get(access_requests::index))
        .route("/access-requests/{id}/approve", post(access_requests::approve))
        .route("/access-requests/{id}/deny", post(access_requests::deny))
        .route("/reports", get(reports::index))
        .route("/exports", get(exports::index))
        .route("/exports/{export_type}", get(exports::download))
        .route("/api/cron/monthly-export", post(cron::monthly_export))
}
