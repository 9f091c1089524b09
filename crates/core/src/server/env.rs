//! Environment variable readers.
//!
//! Empty values count as unset everywhere. Secrets are rejected when they
//! look like a placeholder or carry too little entropy to be random.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

use crate::Email;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a value copied from an example file.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Display) -> Self {
        Self::InvalidEnvVar(key.to_string(), reason.to_string())
    }

    fn insecure(key: &str, reason: impl Display) -> Self {
        Self::InsecureSecret(key.to_string(), reason.to_string())
    }
}

/// Load `.env` from the working directory when there is one.
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
}

#[must_use]
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// # Errors
///
/// Returns `MissingEnvVar` when the variable is unset or blank.
pub fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

#[must_use]
pub fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when unset.
///
/// # Errors
///
/// Returns `InvalidEnvVar` with the parser's message.
pub fn parse_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    or_default(key, default)
        .parse()
        .map_err(|e| ConfigError::invalid(key, e))
}

/// A sample rate in `0.0..=1.0`.
///
/// # Errors
///
/// Returns `InvalidEnvVar` for non-numbers and out-of-range values.
pub fn sample_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = optional(key) else {
        return Ok(default);
    };
    let rate: f32 = raw.parse().map_err(|e| ConfigError::invalid(key, e))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::invalid(key, "must be between 0.0 and 1.0"));
    }
    Ok(rate)
}

/// Comma-separated addresses, blanks skipped.
///
/// # Errors
///
/// Returns `InvalidEnvVar` naming the first malformed address.
pub fn email_list(key: &str) -> Result<Vec<Email>, ConfigError> {
    parse_email_list(key, &or_default(key, ""))
}

fn parse_email_list(key: &str, raw: &str) -> Result<Vec<Email>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Email::parse(s).map_err(|e| ConfigError::invalid(key, e)))
        .collect()
}

/// A required secret that passes [`check_secret`].
///
/// # Errors
///
/// Returns `MissingEnvVar` or `InsecureSecret`.
pub fn secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    check_secret(&value, key)?;
    Ok(SecretString::from(value))
}

/// An optional secret, checked only when present.
///
/// # Errors
///
/// Returns `InsecureSecret` for a weak value.
pub fn optional_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    optional(key)
        .map(|value| {
            check_secret(&value, key)?;
            Ok(SecretString::from(value))
        })
        .transpose()
}

/// A cookie signing secret: a [`secret`] of at least 32 characters.
///
/// # Errors
///
/// Returns `MissingEnvVar` or `InsecureSecret`.
pub fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::insecure(
            key,
            format_args!(
                "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {})",
                value.len()
            ),
        ));
    }
    check_secret(&value, key)?;
    Ok(SecretString::from(value))
}

/// SMTP password, exempt from the entropy check since providers choose it.
///
/// # Errors
///
/// Returns `MissingEnvVar` when unset.
pub fn credential(key: &str) -> Result<SecretString, ConfigError> {
    required(key).map(SecretString::from)
}

/// Reject placeholders and low-entropy values.
///
/// # Errors
///
/// Returns `InsecureSecret` explaining which check failed.
pub fn check_secret(value: &str, key: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::insecure(
            key,
            format_args!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::insecure(
            key,
            format_args!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }
    Ok(())
}

/// Shannon entropy in bits per character.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholders_rejected() {
        for value in ["your-session-key-here", "changeme-cron-token", "SECRET_VALUE_123"] {
            assert!(
                matches!(check_secret(value, "KEY"), Err(ConfigError::InsecureSecret(..))),
                "{value}"
            );
        }
    }

    #[test]
    fn test_low_entropy_rejected() {
        assert!(check_secret("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "KEY").is_err());
    }

    #[test]
    fn test_random_value_accepted() {
        assert!(check_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "KEY").is_ok());
    }

    #[test]
    fn test_email_list_skips_blanks() {
        let list = parse_email_list("ADMINS", " ops@example.com, ,hr@example.com ").unwrap();
        let list: Vec<_> = list.iter().map(Email::as_str).collect();
        assert_eq!(list, ["ops@example.com", "hr@example.com"]);
    }

    #[test]
    fn test_email_list_names_the_variable() {
        let err = parse_email_list("ADMINS", "ops@example.com,not-an-email").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "ADMINS"));
    }
}
