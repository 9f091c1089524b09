//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET  /                         - Product listing (?q=, ?category=)
//! GET  /products/{id}            - Product detail with variants
//!
//! # Cart (HTMX fragments, HX-Trigger: cart-updated)
//! GET  /cart                     - Cart page
//! POST /cart/add                 - Add to cart (returns count badge)
//! POST /cart/update              - Set quantity (returns cart_items fragment)
//! POST /cart/remove              - Remove line (returns cart_items fragment)
//! POST /cart/clear               - Empty cart (returns cart_items fragment)
//! GET  /cart/count               - Cart count badge (fragment)
//! GET  /cart/events              - Server-sent events for other tabs
//!
//! # Checkout (requires auth)
//! GET  /checkout                 - Review cart, balance and address
//! POST /checkout                 - Place order
//!
//! # Account (requires auth)
//! GET  /orders                   - Order history
//! GET  /orders/{id}              - Order detail with tracking
//! GET  /points                   - Balance and ledger history
//! GET  /account                  - Profile and shipping address
//! POST /account                  - Update profile and shipping address
//!
//! # Auth (POSTs rate limited)
//! GET  /auth/login               - Login page
//! POST /auth/login               - Login action
//! POST /auth/logout              - Logout action
//! GET  /auth/forgot-password     - Request reset link
//! POST /auth/forgot-password     - Send reset link
//! GET  /auth/reset-password      - Choose new password (?token=)
//! POST /auth/reset-password      - Set new password
//!
//! # Access requests (POST rate limited)
//! GET  /request-access           - Request access form
//! POST /request-access           - Submit request
//! ```

pub mod access;
pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod points;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Layout data shared by every full page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user_name: Option<String>,
    pub dev_mode: bool,
}

impl Nav {
    /// Build the layout data for the current request.
    #[must_use]
    pub fn new(state: &AppState, user: Option<&CurrentUser>) -> Self {
        Self {
            user_name: user.map(|u| u.display_name().to_string()),
            dev_mode: state.is_dev_mode(),
        }
    }
}

/// Whether a request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/reset-password", get(auth::reset_password_page))
        .merge(limited)
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/events", get(cart::events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let access_limited = Router::new()
        .route("/request-access", post(access::submit))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/", get(catalog::index))
        .route("/products/{id}", get(catalog::show))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/points", get(points::index))
        .route("/account", get(account::show).post(account::update))
        .nest("/auth", auth_routes())
        .route("/request-access", get(access::page))
        .merge(access_limited)
}
