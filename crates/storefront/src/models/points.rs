//! Points ledger row type.

use chrono::{DateTime, Utc};

use perkshop_core::{LedgerEntryId, OrderId, Points, UserId};

/// A ledger entry. Entries are never updated or deleted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub delta: Points,
    pub reason: String,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}
