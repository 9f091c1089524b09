//! Points balance and history.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use perkshop_core::Points;

use super::Nav;
use crate::db::PointsRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::mock;
use crate::models::LedgerEntry;
use crate::state::AppState;

/// Points page template.
#[derive(Template, WebTemplate)]
#[template(path = "points/index.html")]
pub struct PointsTemplate {
    pub nav: Nav,
    pub balance: Points,
    pub entries: Vec<LedgerEntry>,
}

/// Display the balance and every ledger entry, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let (balance, entries) = match state.pool() {
        Some(pool) => {
            let repo = PointsRepository::new(pool);
            (repo.balance(user.id).await?, repo.history(user.id).await?)
        }
        None => (mock::MOCK_BALANCE, mock::ledger(user.id)),
    };

    Ok(PointsTemplate {
        nav: Nav::new(&state, Some(&user)),
        balance,
        entries,
    })
}
