//! Employee profile types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use perkshop_core::{Email, UserId, UserRole};

/// A profile row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub password_hash: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// The profile's shipping address fields.
    #[must_use]
    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.clone(),
            address_line1: self.address_line1.clone().unwrap_or_default(),
            address_line2: self.address_line2.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            postal_code: self.postal_code.clone().unwrap_or_default(),
            country: self.country.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
        }
    }
}

/// Editable name and address fields, as posted by the account form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

impl ShippingAddress {
    /// Whether every field needed to ship is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.address_line1,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    /// Trim all fields.
    #[must_use]
    pub fn trimmed(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self.address_line2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    /// Multi-part address on one line, e.g. for order snapshots and emails.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            self.address_line1.as_str(),
            self.address_line2.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Converts an empty form field into SQL `NULL`.
pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".to_string(),
            address_line1: "12 Analytical Way".to_string(),
            address_line2: String::new(),
            city: "London".to_string(),
            state: "LDN".to_string(),
            postal_code: "N1 7AA".to_string(),
            country: "UK".to_string(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_complete_address() {
        assert!(address().is_complete());
        let mut missing = address();
        missing.city = "  ".to_string();
        assert!(!missing.is_complete());
    }

    #[test]
    fn test_one_line_skips_empty_parts() {
        assert_eq!(
            address().one_line(),
            "12 Analytical Way, London, LDN, N1 7AA, UK"
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  x "), Some("x"));
        assert_eq!(non_empty("   "), None);
    }
}
