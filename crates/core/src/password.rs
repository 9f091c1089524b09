//! Argon2id password hashing.
//!
//! Used by both web binaries for login and by the CLI when bootstrapping
//! admin accounts.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password hashing errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Password shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    TooShort,
    /// Hashing failed.
    #[error("failed to hash password")]
    Hash,
    /// The password does not match, or the stored hash is malformed.
    #[error("invalid credentials")]
    Mismatch,
}

/// Check password length requirements.
///
/// # Errors
///
/// Returns [`PasswordError::TooShort`] for short passwords.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// Hash a password with a random salt (PHC string format).
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if Argon2 fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// Verify a password against a stored PHC hash.
///
/// # Errors
///
/// Returns [`PasswordError::Mismatch`] when the password is wrong or the hash
/// cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert_eq!(
            verify_password("wrong horse", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert_eq!(
            verify_password("anything", "not-a-hash"),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_validate_length() {
        assert_eq!(validate_password("short"), Err(PasswordError::TooShort));
        assert!(validate_password("longenough").is_ok());
    }
}
