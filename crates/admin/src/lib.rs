//! PerkShop admin library.
//!
//! The administration panel: catalog and order management, employee points,
//! access requests, reports, CSV exports and the monthly export job. Exposed
//! as a library so the router and the export job can be driven from tests
//! and from the CLI.
//!
//! # Security
//!
//! This crate grants full control over balances and orders. Every page
//! except login and the health checks requires an active admin session;
//! the cron endpoint requires the shared `CRON_SECRET` instead.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware::from_fn, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Build the full admin router.
///
/// Static files are served from `crates/admin/static`, relative to the
/// working directory.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/admin/static"));

    middleware::with_session_layer(router, &state)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity. Dev mode has no database and is always
/// ready.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;
    use crate::services::cron::CRON_SECRET_HEADER;
    use crate::services::exports::LocalDirStore;

    fn dev_app_with_secret(cron_secret: Option<&str>) -> Router {
        let dir = std::env::temp_dir().join("perkshop-admin-router-tests");
        let mut config = AdminConfig::dev(dir.clone());
        config.cron_secret = cron_secret.map(SecretString::from);
        let state = AppState::with_store(config, None, None, Box::new(LocalDirStore::new(dir)));
        app(state)
    }

    fn dev_app() -> Router {
        dev_app_with_secret(None)
    }

    fn cron_request(secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/cron/monthly-export");
        if let Some(secret) = secret {
            builder = builder.header(CRON_SECRET_HEADER, secret);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = dev_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dashboard_requires_login() {
        let response = dev_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = dev_app()
            .oneshot(Request::get("/auth/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dev_login_starts_session() {
        let response = dev_app()
            .oneshot(
                Request::post("/auth/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=ops%40example.com&password=x"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_cron_without_configured_secret_is_unavailable() {
        let response = dev_app()
            .oneshot(cron_request(Some("anything")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cron_rejects_missing_or_wrong_secret() {
        let app = dev_app_with_secret(Some("s3cret-value"));

        let response = app.clone().oneshot(cron_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(cron_request(Some("wrong"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cron_with_secret_but_no_database() {
        let response = dev_app_with_secret(Some("s3cret-value"))
            .oneshot(cron_request(Some("s3cret-value")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"No database configured");
    }

    #[tokio::test]
    async fn test_pages_without_database_are_unavailable_after_login() {
        let app = dev_app();
        let login = app
            .clone()
            .oneshot(
                Request::post("/auth/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=ops%40example.com&password=x"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = login.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let dashboard = app
            .clone()
            .oneshot(
                Request::get("/")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(dashboard.status(), StatusCode::OK);

        let orders = app
            .oneshot(
                Request::get("/orders")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(orders.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
