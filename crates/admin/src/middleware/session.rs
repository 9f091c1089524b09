//! Admin session layer.
//!
//! Shares the storefront's `tower_sessions.session` table under its own
//! cookie. Admin cookies are `SameSite=Strict` and expire after a day idle.

use axum::Router;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "perkshop_admin_session";

const IDLE_TIMEOUT: Duration = Duration::hours(24);

#[must_use]
pub fn with_session_layer(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    fn layer<S: SessionStore>(store: S, secure: bool) -> SessionManagerLayer<S> {
        SessionManagerLayer::new(store)
            .with_name(SESSION_COOKIE_NAME)
            .with_expiry(Expiry::OnInactivity(IDLE_TIMEOUT))
            .with_secure(secure)
            .with_same_site(SameSite::Strict)
            .with_http_only(true)
            .with_path("/")
    }

    let secure = state.config().is_https();
    match state.pool() {
        Some(pool) => router.layer(layer(PostgresStore::new(pool.clone()), secure)),
        None => router.layer(layer(MemoryStore::default(), secure)),
    }
}
