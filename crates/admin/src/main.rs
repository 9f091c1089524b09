//! PerkShop admin - internal administration panel.
//!
//! Serves the panel and the monthly export cron endpoint on port 3001,
//! sharing the storefront's database. Without `DATABASE_URL` any email logs
//! in, the dashboard shows zeros, and everything else answers 503.

#![cfg_attr(not(test), forbid(unsafe_code))]

use perkshop_admin::config::AdminConfig;
use perkshop_admin::state::AppState;
use perkshop_admin::{app, db};
use perkshop_core::server::shutdown_signal;

#[tokio::main]
async fn main() {
    let config = AdminConfig::from_env().expect("Failed to load configuration");
    let _sentry = config
        .telemetry
        .init(sentry::release_name!(), "perkshop_admin=info,tower_http=debug");

    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set, the monthly export endpoint is disabled");
    }

    let pool = if let Some(url) = &config.database_url {
        Some(
            db::create_pool(url)
                .await
                .expect("Failed to create database pool"),
        )
    } else {
        tracing::warn!("DATABASE_URL not set, running in dev mode");
        None
    };

    let addr = config.socket_addr();
    let state = AppState::new(config, pool).expect("Failed to initialize application state");
    tracing::info!(store = %state.export_store().describe(), "Export storage configured");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "admin listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}
