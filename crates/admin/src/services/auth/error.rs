//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] perkshop_core::EmailError),

    /// Unknown email, wrong password, inactive profile, or not an admin.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<perkshop_core::password::PasswordError> for AdminAuthError {
    fn from(err: perkshop_core::password::PasswordError) -> Self {
        use perkshop_core::password::PasswordError;
        match err {
            PasswordError::TooShort => Self::WeakPassword(err.to_string()),
            PasswordError::Hash => Self::PasswordHash,
            PasswordError::Mismatch => Self::InvalidCredentials,
        }
    }
}
