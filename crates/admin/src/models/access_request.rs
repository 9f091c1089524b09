//! Access request rows.

use chrono::{DateTime, Utc};

use perkshop_core::{AccessRequestId, AccessRequestStatus, Email, UserId};

/// A request from someone without an account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessRequest {
    pub id: AccessRequestId,
    pub email: Email,
    pub full_name: String,
    pub message: Option<String>,
    pub status: AccessRequestStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
}
