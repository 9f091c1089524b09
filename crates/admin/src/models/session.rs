//! The admin identity kept in the session cookie's server-side record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use perkshop_core::{Email, UserId};

/// Session key under which [`CurrentAdmin`] is stored.
pub const CURRENT_ADMIN_KEY: &str = "admin";

/// Signed-in admin, as written at login.
///
/// Role and active flag are checked at login only; demoting or deactivating
/// an admin takes effect on their next login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub signed_in_at: DateTime<Utc>,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(id: UserId, email: Email, name: impl Into<String>) -> Self {
        Self {
            id,
            email,
            name: name.into(),
            signed_in_at: Utc::now(),
        }
    }

    /// Name for the header bar, falling back to the email for blank names.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            self.email.as_str()
        } else {
            name
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let email = Email::parse("ops@example.com").unwrap();
        let named = CurrentAdmin::new(UserId::new_v4(), email.clone(), "  Pat Lee ");
        assert_eq!(named.display_name(), "Pat Lee");

        let blank = CurrentAdmin::new(UserId::new_v4(), email, "   ");
        assert_eq!(blank.display_name(), "ops@example.com");
    }
}
