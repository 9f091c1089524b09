//! Monthly export ledger rows.

use chrono::{DateTime, Utc};

use perkshop_core::ExportId;
use perkshop_core::csv::ExportType;

/// One recorded export file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonthlyExport {
    pub id: ExportId,
    pub period: String,
    pub export_type: ExportType,
    pub file_path: String,
    pub row_count: i32,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}
