//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use perkshop_core::Points;

use super::Nav;
use crate::db::{PointsRepository, ProfileRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, refresh_current_user};
use crate::mock;
use crate::models::{CurrentUser, Profile, ShippingAddress};
use crate::state::AppState;

/// Query parameters for the saved banner.
#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub saved: Option<String>,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/show.html")]
pub struct AccountTemplate {
    pub nav: Nav,
    pub email: String,
    pub balance: Points,
    pub address: ShippingAddress,
    pub saved: bool,
    pub error: Option<String>,
}

async fn load_profile(state: &AppState, user: &CurrentUser) -> Result<(Profile, Points)> {
    let Some(pool) = state.pool() else {
        return Ok((mock::profile(user), mock::MOCK_BALANCE));
    };
    let profile = ProfileRepository::new(pool)
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("profile no longer exists".to_string()))?;
    let balance = PointsRepository::new(pool).balance(user.id).await?;
    Ok((profile, balance))
}

/// Display the profile and shipping address form.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<AccountQuery>,
) -> Result<impl IntoResponse> {
    let (profile, balance) = load_profile(&state, &user).await?;

    Ok(AccountTemplate {
        nav: Nav::new(&state, Some(&user)),
        email: profile.email.to_string(),
        balance,
        address: profile.shipping_address(),
        saved: query.saved.is_some(),
        error: None,
    })
}

/// Save the profile and shipping address.
///
/// The session's display name is refreshed so the header updates at once.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingAddress>,
) -> Result<Response> {
    let address = form.trimmed();

    if address.full_name.is_empty() {
        let (profile, balance) = load_profile(&state, &user).await?;
        return Ok(AccountTemplate {
            nav: Nav::new(&state, Some(&user)),
            email: profile.email.to_string(),
            balance,
            address,
            saved: false,
            error: Some("Name is required.".to_string()),
        }
        .into_response());
    }

    let pool = state.db()?;
    ProfileRepository::new(pool)
        .update_address(user.id, &address)
        .await?;

    let refreshed = CurrentUser {
        full_name: address.full_name,
        ..user
    };
    refresh_current_user(&session, &refreshed).await?;
    tracing::info!("Profile updated");

    Ok(Redirect::to("/account?saved=1").into_response())
}
