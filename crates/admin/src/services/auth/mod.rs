//! Admin authentication service.
//!
//! Admins are `profiles` rows with role `admin`. Login checks the role, the
//! active flag and the Argon2 password hash, and reports every failure as
//! the same `InvalidCredentials`.

mod error;

pub use error::AdminAuthError;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use perkshop_core::password::{hash_password, validate_password, verify_password};
use perkshop_core::{Email, UserId, UserRole};

use crate::db::users::LoginProfile;
use crate::db::{ResetTokenRepository, UserRepository};
use crate::models::CurrentAdmin;

/// How long a set-password link sent on approval stays valid.
pub const SET_PASSWORD_TTL_HOURS: i64 = 72;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
    tokens: ResetTokenRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: ResetTokenRepository::new(pool),
        }
    }

    /// Authenticate an admin with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for unknown emails,
    /// non-admins, inactive profiles and wrong passwords alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentAdmin, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let profile = self
            .users
            .get_login(&email)
            .await?
            .filter(is_active_admin)
            .ok_or(AdminAuthError::InvalidCredentials)?;

        let hash = profile
            .password_hash
            .as_deref()
            .ok_or(AdminAuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        Ok(CurrentAdmin::new(profile.id, profile.email, profile.full_name))
    }

    /// Create an admin or promote an existing profile, setting its password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail` or `AdminAuthError::WeakPassword`
    /// for bad input.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserId, AdminAuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let hash = hash_password(password)?;
        Ok(self.users.upsert_admin(&email, name.trim(), &hash).await?)
    }

    /// Issue a single-use set-password token and return the raw token for
    /// the link. Only its SHA-256 digest is stored.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Repository` if the token cannot be stored.
    pub async fn issue_set_password_token(&self, user_id: UserId) -> Result<String, AdminAuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(SET_PASSWORD_TTL_HOURS);
        self.tokens
            .create(&hash_token(&token), user_id, expires_at)
            .await?;
        Ok(token)
    }
}

fn is_active_admin(profile: &LoginProfile) -> bool {
    profile.is_active && profile.role == UserRole::Admin
}

/// 32 random bytes, base64url without padding.
fn generate_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// SHA-256 hex digest of a token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(role: UserRole, is_active: bool) -> LoginProfile {
        LoginProfile {
            id: UserId::new_v4(),
            email: Email::parse("ops@example.com").unwrap(),
            full_name: "Ops".to_string(),
            role,
            is_active,
            password_hash: None,
        }
    }

    #[test]
    fn test_only_active_admins_may_log_in() {
        assert!(is_active_admin(&profile(UserRole::Admin, true)));
        assert!(!is_active_admin(&profile(UserRole::Admin, false)));
        assert!(!is_active_admin(&profile(UserRole::User, true)));
    }

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let digest = hash_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
