//! Monthly CSV export job.
//!
//! For a period, each export type runs concurrently and independently:
//!
//! 1. Skip with `AlreadyExported` if the ledger has `(period, type)`.
//! 2. Load the period's rows; `NoData` when there are none.
//! 3. Encode CSV and upload `{YYYY-MM}_{type}.csv`.
//! 4. Record path, row count and SHA-256 checksum in the ledger.
//!
//! Any failing step yields `Failed` for that type only. Nothing is rolled
//! back and nothing is retried: a file uploaded before a failed ledger
//! insert stays in storage, and the next run reports the upload conflict.

mod source;
mod store;

pub use source::{ExportRecord, ExportSource, PgExportSource};
pub use store::{HttpBucketStore, LocalDirStore, ObjectStore, StorageError, from_config};

use sha2::{Digest, Sha256};
use thiserror::Error;

use perkshop_core::csv::ExportType;
use perkshop_core::export::{ExportOutcome, ExportPeriod, ExportReport};

use crate::db::RepositoryError;

/// Content type of uploaded files.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Errors from one export attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Reading rows or writing the ledger failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Uploading the file failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The row count does not fit the ledger column.
    #[error("too many rows: {0}")]
    TooManyRows(usize),
}

/// SHA-256 hex digest of a file body.
#[must_use]
pub fn checksum(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Run the job for one period.
pub async fn run_monthly_export(
    source: &dyn ExportSource,
    store: &dyn ObjectStore,
    period: ExportPeriod,
) -> ExportReport {
    tracing::info!(period = %period, store = %store.describe(), "Starting monthly export");

    let (orders, items, ledger) = tokio::join!(
        export_type(source, store, period, ExportType::Orders),
        export_type(source, store, period, ExportType::OrderItems),
        export_type(source, store, period, ExportType::PointsLedger),
    );

    let report = ExportReport::new(
        period,
        vec![
            (ExportType::Orders, orders),
            (ExportType::OrderItems, items),
            (ExportType::PointsLedger, ledger),
        ],
    );

    if report.failures() > 0 {
        tracing::warn!(
            period = %period,
            failures = report.failures(),
            "Monthly export finished with failures"
        );
    } else {
        tracing::info!(period = %period, "Monthly export finished");
    }

    report
}

/// Export one type, folding any error into `ExportOutcome::Failed`.
pub async fn export_type(
    source: &dyn ExportSource,
    store: &dyn ObjectStore,
    period: ExportPeriod,
    export_type: ExportType,
) -> ExportOutcome {
    match try_export(source, store, period, export_type).await {
        Ok(outcome) => {
            tracing::info!(period = %period, export_type = %export_type, outcome = ?outcome, "Export step done");
            outcome
        }
        Err(e) => {
            tracing::error!(period = %period, export_type = %export_type, error = %e, "Export failed");
            ExportOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

async fn try_export(
    source: &dyn ExportSource,
    store: &dyn ObjectStore,
    period: ExportPeriod,
    export_type: ExportType,
) -> Result<ExportOutcome, ExportError> {
    if source.already_exported(period, export_type).await? {
        return Ok(ExportOutcome::AlreadyExported);
    }

    let (start, end) = period.bounds();
    let rows = source.load_rows(export_type, start, end).await?;
    if rows.is_empty() {
        return Ok(ExportOutcome::NoData);
    }

    let body = rows.to_csv().into_bytes();
    let row_count = i32::try_from(rows.len()).map_err(|_| ExportError::TooManyRows(rows.len()))?;
    let checksum = checksum(&body);

    let path = store
        .put(&period.file_name(export_type), body, CSV_CONTENT_TYPE)
        .await?;

    source
        .record(&ExportRecord {
            period,
            export_type,
            file_path: path.clone(),
            row_count,
            checksum,
        })
        .await?;

    Ok(ExportOutcome::Exported {
        path,
        rows: rows.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use perkshop_core::csv::{ExportRows, LedgerExportRow};
    use perkshop_core::{LedgerEntryId, Points, UserId};

    use super::*;

    #[derive(Default)]
    struct FakeSource {
        ledger: Vec<LedgerExportRow>,
        exported: Vec<ExportType>,
        fail_orders: bool,
        recorded: Mutex<Vec<ExportRecord>>,
    }

    #[async_trait]
    impl ExportSource for FakeSource {
        async fn already_exported(
            &self,
            _period: ExportPeriod,
            export_type: ExportType,
        ) -> Result<bool, RepositoryError> {
            Ok(self.exported.contains(&export_type))
        }

        async fn load_rows(
            &self,
            export_type: ExportType,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<ExportRows, RepositoryError> {
            match export_type {
                ExportType::Orders if self.fail_orders => {
                    Err(RepositoryError::DataCorruption("boom".to_string()))
                }
                ExportType::Orders => Ok(ExportRows::Orders(Vec::new())),
                ExportType::OrderItems => Ok(ExportRows::OrderItems(Vec::new())),
                ExportType::PointsLedger => Ok(ExportRows::PointsLedger(
                    self.ledger
                        .iter()
                        .filter(|r| r.created_at >= start && r.created_at < end)
                        .cloned()
                        .collect(),
                )),
            }
        }

        async fn record(&self, record: &ExportRecord) -> Result<(), RepositoryError> {
            self.recorded.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put(
            &self,
            key: &str,
            body: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            self.objects.lock().unwrap().insert(key.to_string(), body);
            Ok(format!("exports/{key}"))
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    fn ledger_row(day: u32, delta: i64) -> LedgerExportRow {
        LedgerExportRow {
            id: LedgerEntryId::new_v4(),
            user_id: UserId::new_v4(),
            user_email: Some("ada@example.com".to_string()),
            delta: Points::new(delta),
            reason: "Monthly allowance".to_string(),
            order_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
        }
    }

    fn may() -> ExportPeriod {
        ExportPeriod::new(2024, 5).unwrap()
    }

    #[tokio::test]
    async fn test_exports_ledger_and_reports_no_data() {
        let source = FakeSource {
            ledger: vec![ledger_row(1, 500), ledger_row(31, -200)],
            ..FakeSource::default()
        };
        let store = FakeStore::default();

        let report = run_monthly_export(&source, &store, may()).await;

        assert_eq!(report.http_status(), 200);
        assert_eq!(report.outcome(ExportType::Orders), Some(&ExportOutcome::NoData));
        assert_eq!(
            report.outcome(ExportType::PointsLedger),
            Some(&ExportOutcome::Exported {
                path: "exports/2024-05_points_ledger.csv".to_string(),
                rows: 2,
            })
        );

        let objects = store.objects.lock().unwrap();
        let body = objects.get("2024-05_points_ledger.csv").unwrap();
        let recorded = source.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].row_count, 2);
        assert_eq!(recorded[0].checksum, checksum(body));
    }

    #[tokio::test]
    async fn test_already_exported_is_skipped() {
        let source = FakeSource {
            ledger: vec![ledger_row(3, 100)],
            exported: vec![ExportType::PointsLedger],
            ..FakeSource::default()
        };
        let store = FakeStore::default();

        let report = run_monthly_export(&source, &store, may()).await;

        assert_eq!(
            report.outcome(ExportType::PointsLedger),
            Some(&ExportOutcome::AlreadyExported)
        );
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_is_partial() {
        let source = FakeSource {
            ledger: vec![ledger_row(3, 100)],
            fail_orders: true,
            ..FakeSource::default()
        };
        let store = FakeStore::default();

        let report = run_monthly_export(&source, &store, may()).await;

        assert!(report.outcome(ExportType::Orders).unwrap().is_failure());
        assert!(matches!(
            report.outcome(ExportType::PointsLedger),
            Some(ExportOutcome::Exported { .. })
        ));
        assert_eq!(report.http_status(), 207);
    }

    #[test]
    fn test_checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
