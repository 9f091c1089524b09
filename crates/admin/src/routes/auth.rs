//! Authentication route handlers for admin.
//!
//! Password login for profiles with role `admin`. In dev mode (no database)
//! any well-formed email logs in as a demo admin.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use perkshop_core::{Email, UserId};

use super::render;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, end_admin_session, start_admin_session};
use crate::models::CurrentAdmin;
use crate::services::auth::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    error: Option<&'static str>,
    dev_mode: bool,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password, or this account is not an admin.",
        "unavailable" => "Login is temporarily unavailable. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }

    render(&LoginPageTemplate {
        error: query.error.as_deref().map(error_message),
        dev_mode: state.is_dev_mode(),
    })
    .into_response()
}

/// Verify credentials and start an admin session.
///
/// POST /auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let admin = match state.pool() {
        Some(pool) => match AdminAuthService::new(pool)
            .login(&form.email, &form.password)
            .await
        {
            Ok(admin) => admin,
            Err(AdminAuthError::InvalidCredentials) => {
                tracing::info!("Admin login rejected");
                return Ok(Redirect::to("/auth/login?error=credentials").into_response());
            }
            Err(e) => {
                tracing::error!(error = %e, "Admin login failed");
                return Ok(Redirect::to("/auth/login?error=unavailable").into_response());
            }
        },
        None => match Email::parse(&form.email) {
            Ok(email) => {
                CurrentAdmin::new(UserId::from_uuid(uuid::Uuid::nil()), email, "Demo Admin")
            }
            Err(_) => return Ok(Redirect::to("/auth/login?error=credentials").into_response()),
        },
    };

    start_admin_session(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Redirect::to("/").into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = end_admin_session(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert!(error_message("credentials").contains("not an admin"));
        assert!(error_message("unavailable").contains("temporarily"));
        assert!(error_message("anything").contains("Something went wrong"));
    }
}
