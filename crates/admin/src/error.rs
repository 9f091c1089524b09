//! Error type for admin handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AdminAuthError;
use crate::services::exports::ExportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected form input or an action the panel refuses, such as an
    /// admin demoting themselves.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A database-backed page or write was requested without a database.
    #[error("Dev mode has no database")]
    DevModeReadOnly,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Auth(AdminAuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AdminAuthError::InvalidEmail(_) | AdminAuthError::WeakPassword(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::DevModeReadOnly => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_)
            | Self::Auth(AdminAuthError::Repository(_) | AdminAuthError::PasswordHash)
            | Self::Session(_)
            | Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text for the response body. Server failures stay generic.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::Auth(AdminAuthError::WeakPassword(msg)) => msg.clone(),
            Self::Auth(AdminAuthError::InvalidCredentials) => {
                "Invalid email or password".to_string()
            }
            Self::Auth(AdminAuthError::InvalidEmail(_)) => "Invalid email address".to_string(),
            Self::DevModeReadOnly => "The admin panel is running without a database (dev mode); \
                                      set DATABASE_URL to manage the shop"
                .to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
            Self::Database(_) | Self::Auth(_) | Self::Session(_) | Self::Export(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Admin request error");
        }

        (status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Tag Sentry events with the signed-in admin.
pub fn set_sentry_user(admin_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_form_errors() {
        assert_eq!(
            status_of(AppError::BadRequest("price must be positive".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::DevModeReadOnly),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Database(RepositoryError::Conflict(
                "balance is 10 points".to_string()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Database(RepositoryError::DataCorruption(
                "bad".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_message_reaches_the_admin() {
        let err = AppError::Database(RepositoryError::Conflict("order is cancelled".to_string()));
        assert_eq!(err.public_message(), "order is cancelled");

        let err = AppError::Auth(AdminAuthError::PasswordHash);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
