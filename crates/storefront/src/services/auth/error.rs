//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] perkshop_core::EmailError),

    /// Wrong password, unknown email, or a deactivated profile.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Reset token unknown, used, or expired.
    #[error("invalid or expired reset token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<perkshop_core::password::PasswordError> for AuthError {
    fn from(err: perkshop_core::password::PasswordError) -> Self {
        use perkshop_core::password::PasswordError;
        match err {
            PasswordError::TooShort => Self::WeakPassword(err.to_string()),
            PasswordError::Hash => Self::PasswordHash,
            PasswordError::Mismatch => Self::InvalidCredentials,
        }
    }
}
