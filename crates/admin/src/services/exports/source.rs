//! Where export rows come from and where finished exports are recorded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use perkshop_core::csv::{ExportRows, ExportType};
use perkshop_core::export::ExportPeriod;

use crate::db::{ExportRepository, RepositoryError};

/// A finished upload, ready for the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub period: ExportPeriod,
    pub export_type: ExportType,
    pub file_path: String,
    pub row_count: i32,
    pub checksum: String,
}

/// Rows and ledger access for the export job.
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Whether `(period, type)` has already been exported.
    async fn already_exported(
        &self,
        period: ExportPeriod,
        export_type: ExportType,
    ) -> Result<bool, RepositoryError>;

    /// Rows of one type created in `[start, end)`.
    async fn load_rows(
        &self,
        export_type: ExportType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ExportRows, RepositoryError>;

    /// Add a finished export to the ledger.
    async fn record(&self, record: &ExportRecord) -> Result<(), RepositoryError>;
}

/// The `PostgreSQL` source.
#[derive(Clone)]
pub struct PgExportSource {
    pool: PgPool,
}

impl PgExportSource {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExportSource for PgExportSource {
    async fn already_exported(
        &self,
        period: ExportPeriod,
        export_type: ExportType,
    ) -> Result<bool, RepositoryError> {
        ExportRepository::new(&self.pool)
            .exists(&period.label(), export_type)
            .await
    }

    async fn load_rows(
        &self,
        export_type: ExportType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ExportRows, RepositoryError> {
        let repo = ExportRepository::new(&self.pool);
        Ok(match export_type {
            ExportType::Orders => ExportRows::Orders(repo.orders_between(start, end).await?),
            ExportType::OrderItems => {
                ExportRows::OrderItems(repo.order_items_between(start, end).await?)
            }
            ExportType::PointsLedger => {
                ExportRows::PointsLedger(repo.ledger_between(start, end).await?)
            }
        })
    }

    async fn record(&self, record: &ExportRecord) -> Result<(), RepositoryError> {
        ExportRepository::new(&self.pool)
            .record(
                &record.period.label(),
                record.export_type,
                &record.file_path,
                record.row_count,
                &record.checksum,
            )
            .await?;
        Ok(())
    }
}
