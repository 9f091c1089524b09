//! Integration tests for PerkShop.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (dev mode, no database)
//! cargo test -p perkshop-integration-tests
//!
//! # Database and live-server tests
//! task db:start
//! DATABASE_URL=postgres://... cargo test -p perkshop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_flow` - Catalog, cart and auth redirects through the storefront router
//! - `admin_flow` - Admin login, navigation and the cron endpoint
//! - `export_job` - Monthly export against local disk storage
//! - `cart_sync` - Cart stores kept in step through storage events
//! - `properties` - Cart invariants, CSV round-trips and tracking examples
//! - `database` - Checkout, cancellation refunds and ledger rules (`PostgreSQL`)
//! - `live_servers` - Smoke tests against running binaries
//!
//! This library holds the helpers shared by those tests.

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use sqlx::PgPool;
use tower::ServiceExt;

use perkshop_admin::config::AdminConfig;
use perkshop_admin::services::exports::LocalDirStore;
use perkshop_storefront::config::StorefrontConfig;

/// Base URL used by the dev-mode storefront under test.
pub const STOREFRONT_BASE_URL: &str = "http://localhost:3000";

/// A fresh scratch directory under the system temp dir.
#[must_use]
pub fn scratch_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::new_v4()))
}

/// Storefront router in dev mode (mock catalog, in-memory sessions).
///
/// # Panics
///
/// Panics if the state cannot be built.
#[must_use]
pub fn storefront_app() -> Router {
    let state = perkshop_storefront::state::AppState::new(
        StorefrontConfig::dev(STOREFRONT_BASE_URL),
        None,
    )
    .expect("Failed to build storefront state");
    perkshop_storefront::app(state)
}

/// Admin router in dev mode, writing exports to a scratch directory.
#[must_use]
pub fn admin_app(cron_secret: Option<&str>) -> Router {
    let dir = scratch_dir("perkshop-admin-it");
    let mut config = AdminConfig::dev(dir.clone());
    config.cron_secret = cron_secret.map(SecretString::from);
    let state = perkshop_admin::state::AppState::with_store(
        config,
        None,
        None,
        Box::new(LocalDirStore::new(dir)),
    );
    perkshop_admin::app(state)
}

/// Send one request through a router.
///
/// # Panics
///
/// Panics if the router fails, which axum routers never do.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("Router is infallible")
}

/// Collect a response body as UTF-8 text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// The `name=value` part of the first `Set-Cookie` header, for replaying a session.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::LOCATION)?.to_str().ok()
}

/// Connect to `DATABASE_URL` and run the migrations.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}
