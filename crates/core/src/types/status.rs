//! Status enums for various entities.
//!
//! Each enum maps to a `PostgreSQL` enum type of the same name (with the
//! `postgres` feature) and to a lowercase string for forms and CSV output.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown status string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Generates `as_str`, `Display`, `FromStr`, and `ALL` for a unit enum.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The lowercase wire/database form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether the order can still change status.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Shipped)
    }
}

/// Profile role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Employee redeeming points.
    #[default]
    User,
    /// Store administrator.
    Admin,
}

string_enum!(UserRole, "user role", {
    User => "user",
    Admin => "admin",
});

/// Access request review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "access_request_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AccessRequestStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

string_enum!(AccessRequestStatus, "access request status", {
    Pending => "pending",
    Approved => "approved",
    Denied => "denied",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "lost".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost");
    }

    #[test]
    fn test_open_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Shipped.is_open());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn test_role_serde_matches_as_str() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, format!("\"{}\"", UserRole::Admin.as_str()));
    }
}
