//! Authentication service.
//!
//! Password login against `profiles` and the forgot/reset password flow.
//! Reset tokens are 32 random bytes, base64url-encoded for the link; only
//! their SHA-256 hex digest is stored.

mod error;

pub use error::AuthError;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use perkshop_core::password::{hash_password, validate_password, verify_password};
use perkshop_core::{Email, UserId};

use crate::db::{ProfileRepository, ResetTokenRepository, profiles, reset_tokens};
use crate::models::Profile;

/// How long a reset link stays valid.
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    profiles: ProfileRepository<'a>,
    tokens: ResetTokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            profiles: ProfileRepository::new(pool),
            tokens: ResetTokenRepository::new(pool),
        }
    }

    /// Authenticate an employee with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for unknown emails, inactive
    /// profiles, profiles without a password, and wrong passwords alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let profile = self
            .profiles
            .get_by_email(&email)
            .await?
            .filter(|p| p.is_active)
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = profile
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(profile)
    }

    /// Issue a reset token for an active profile.
    ///
    /// Returns `None` when no active profile has this email, so callers can
    /// answer identically either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    pub async fn start_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(Profile, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some(profile) = self
            .profiles
            .get_by_email(&email)
            .await?
            .filter(|p| p.is_active)
        else {
            return Ok(None);
        };

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.tokens
            .create(&hash_token(&token), profile.id, expires_at)
            .await?;

        Ok(Some((profile, token)))
    }

    /// Whether a reset link is still usable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn reset_token_is_valid(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.tokens.is_valid(&hash_token(token)).await?)
    }

    /// Consume a reset token and set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for short passwords and
    /// `AuthError::InvalidToken` if the token was used, expired, or unknown.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<UserId, AuthError> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await.map_err(crate::db::RepositoryError::from)?;
        let user_id = reset_tokens::consume(&mut tx, &hash_token(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;
        profiles::set_password_hash(&mut tx, user_id, &password_hash).await?;
        tx.commit().await.map_err(crate::db::RepositoryError::from)?;

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(user_id)
    }
}

/// Generate a random URL-safe token.
#[must_use]
pub fn generate_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// SHA-256 hex digest of a token, as stored at rest.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
