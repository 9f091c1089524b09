//! Session layer.
//!
//! Sessions hold the signed-in employee and the cart. They live in the
//! `tower_sessions.session` table, or in memory in dev mode.

use axum::Router;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "perkshop_session";

/// Idle lifetime. A week keeps a half-built cart around between visits.
const IDLE_TIMEOUT: Duration = Duration::days(7);

fn session_layer<S: SessionStore>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(IDLE_TIMEOUT))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Wrap the router in a session layer backed by the state's store.
#[must_use]
pub fn with_session_layer(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let secure = state.config().is_https();
    match state.pool() {
        Some(pool) => router.layer(session_layer(PostgresStore::new(pool.clone()), secure)),
        None => router.layer(session_layer(MemoryStore::default(), secure)),
    }
}
