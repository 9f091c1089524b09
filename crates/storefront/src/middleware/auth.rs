//! Signed-in employee extractors and session helpers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CURRENT_USER_KEY, CurrentUser};

/// A signed-in employee.
///
/// Page loads without one are sent to the login form. HTMX swaps and the
/// cart event stream get a bare 401 instead, since a redirect would land
/// the login page inside a fragment.
pub struct RequireAuth(pub CurrentUser);

/// The signed-in employee when there is one.
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub struct NotSignedIn {
    fragment: bool,
}

impl IntoResponse for NotSignedIn {
    fn into_response(self) -> Response {
        if self.fragment {
            StatusCode::UNAUTHORIZED.into_response()
        } else {
            Redirect::to("/auth/login").into_response()
        }
    }
}

fn is_fragment_request(parts: &Parts) -> bool {
    let streaming = parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"));
    streaming || parts.headers.contains_key("hx-request")
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(CURRENT_USER_KEY)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Unreadable session"))
        .ok()
        .flatten()
}

impl<S: Send + Sync> FromRequestParts<S> for RequireAuth {
    type Rejection = NotSignedIn;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts).await {
            Some(user) => Ok(Self(user)),
            None => Err(NotSignedIn {
                fragment: is_fragment_request(parts),
            }),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Sign the employee in under a fresh session ID. The cart carries over.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(CURRENT_USER_KEY, user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Rewrite the stored employee after a profile edit, keeping the session ID.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn refresh_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(CURRENT_USER_KEY, user).await
}

/// Sign out, dropping the cart along with the rest of the session.
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}
