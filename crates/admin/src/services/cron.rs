//! Shared-secret check for the cron endpoint.

use sha2::{Digest, Sha256};

/// Header carrying the cron secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Whether `provided` matches `expected`.
///
/// Both sides are hashed first so the comparison always runs over 64 hex
/// characters and leaks neither content nor length through timing.
#[must_use]
pub fn verify_cron_secret(expected: &str, provided: &str) -> bool {
    let expected = hex::encode(Sha256::digest(expected.as_bytes()));
    let provided = hex::encode(Sha256::digest(provided.as_bytes()));
    constant_time_compare(&expected, &provided)
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_different() {
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[test]
    fn test_verify_cron_secret() {
        assert!(verify_cron_secret("s3cret-value", "s3cret-value"));
        assert!(!verify_cron_secret("s3cret-value", "s3cret-valuE"));
        assert!(!verify_cron_secret("s3cret-value", ""));
    }
}
