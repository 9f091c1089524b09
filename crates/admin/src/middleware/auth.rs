//! Admin session extractors.
//!
//! Every page except the login form and the cron endpoint takes
//! [`RequireAdminAuth`]. There is no JSON surface behind a login, so a
//! missing session always bounces to the login form.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CURRENT_ADMIN_KEY, CurrentAdmin};

const LOGIN_PATH: &str = "/auth/login";

/// A signed-in admin, or a redirect to the login form.
pub struct RequireAdminAuth(pub CurrentAdmin);

/// The signed-in admin when there is one.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

/// Rejection for [`RequireAdminAuth`].
#[derive(Debug)]
pub struct LoginRequired;

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Read the admin out of the request's session, treating a missing session
/// layer or an unreadable record as signed out.
async fn session_admin(parts: &Parts) -> Option<CurrentAdmin> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentAdmin>(CURRENT_ADMIN_KEY).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable admin session");
            None
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequireAdminAuth {
    type Rejection = LoginRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_admin(parts).await.map(Self).ok_or(LoginRequired)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for OptionalAdminAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_admin(parts).await))
    }
}

/// Store the admin in a fresh session ID.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn start_admin_session(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(CURRENT_ADMIN_KEY, admin).await
}

/// Drop the session record and its cookie.
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn end_admin_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
