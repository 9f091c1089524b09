//! Handler error type.
//!
//! Server-side failures go to Sentry and the log and reach the browser as a
//! generic message. Everything else is the employee's problem and says so.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

const GENERIC_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Signed-in session that no longer maps to a profile.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A write was attempted while running on the mock catalog.
    #[error("Dev mode is read-only")]
    DevModeReadOnly,
}

impl AppError {
    /// Status and browser-facing message.
    fn parts(&self) -> (StatusCode, String) {
        match self {
            Self::Database(_) | Self::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.to_string())
            }
            Self::Auth(err) => auth_parts(err),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::DevModeReadOnly => (
                StatusCode::SERVICE_UNAVAILABLE,
                "The shop is running without a database (dev mode); changes cannot be saved"
                    .to_string(),
            ),
        }
    }
}

fn auth_parts(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
        }
        AuthError::InvalidToken => (
            StatusCode::BAD_REQUEST,
            "This reset link is invalid or has expired".to_string(),
        ),
        AuthError::Repository(_) | AuthError::PasswordHash => {
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();

        // Dev mode refusals are expected and not worth an event.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request error");
        }

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Tag Sentry events from this request with the signed-in employee.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a step in the employee's trail, attached to later Sentry events.
pub fn add_breadcrumb<'a>(
    category: &str,
    message: &str,
    data: impl IntoIterator<Item = (&'a str, String)>,
) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data: data
            .into_iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value)))
            .collect(),
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            status_of(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::BadRequest("quantity".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Unauthorized("gone".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidToken)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_dev_mode_is_service_unavailable() {
        assert_eq!(
            status_of(AppError::DevModeReadOnly),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Auth(AuthError::PasswordHash);
        let (status, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, GENERIC_MESSAGE);
    }

    #[test]
    fn test_client_messages_name_the_problem() {
        let (_, message) = AppError::NotFound("order abc".to_string()).parts();
        assert_eq!(message, "Not found: order abc");

        let (_, message) = AppError::Auth(AuthError::WeakPassword("too short".to_string())).parts();
        assert_eq!(message, "too short");
    }
}
