//! Employee rows as seen by admins.

use chrono::{DateTime, Utc};

use perkshop_core::{Email, LedgerEntryId, OrderId, Points, UserId, UserRole};

/// A profile row with its computed balance.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub balance: Points,
    pub created_at: DateTime<Utc>,
}

impl UserSummary {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A ledger entry, with the admin who created manual adjustments.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub delta: Points,
    pub reason: String,
    pub order_id: Option<OrderId>,
    pub created_by_email: Option<String>,
    pub created_at: DateTime<Utc>,
}
