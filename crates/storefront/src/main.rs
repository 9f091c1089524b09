//! PerkShop storefront - employee rewards shop.
//!
//! Serves the catalog, cart, checkout and order history on port 3000.
//! Without `DATABASE_URL` it starts in dev mode: a fixed demo catalog, a
//! demo employee, and 503 for anything that would write to the database.
//!
//! Migrations are not run here; use `perkshop-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use perkshop_core::server::shutdown_signal;
use perkshop_storefront::config::StorefrontConfig;
use perkshop_storefront::state::AppState;
use perkshop_storefront::{app, db};

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");
    let _sentry = config.telemetry.init(
        sentry::release_name!(),
        "perkshop_storefront=info,tower_http=debug",
    );

    let pool = match &config.database_url {
        Some(url) => Some(
            db::create_pool(url)
                .await
                .expect("Failed to create database pool"),
        ),
        None => {
            tracing::warn!("DATABASE_URL not set, running in dev mode with demo data");
            None
        }
    };

    let addr = config.socket_addr();
    let state = AppState::new(config, pool).expect("Failed to initialize application state");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, dev_mode = state.is_dev_mode(), "storefront listening");

    // The rate limiter falls back to the peer address when no proxy header is set.
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}
