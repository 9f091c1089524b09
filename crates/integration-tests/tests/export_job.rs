//! Monthly export job against real files on local disk.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use perkshop_admin::db::RepositoryError;
use perkshop_admin::services::exports::{
    ExportRecord, ExportSource, LocalDirStore, checksum, run_monthly_export,
};
use perkshop_core::csv::{
    ExportRows, ExportType, LedgerExportRow, OrderExportRow, OrderItemExportRow,
};
use perkshop_core::export::{ExportOutcome, ExportPeriod};
use perkshop_core::{
    LedgerEntryId, OrderId, OrderItemId, OrderStatus, Points, ProductId, UserId,
};
use perkshop_integration_tests::scratch_dir;

/// In-memory rows plus an export ledger.
#[derive(Default)]
struct MemorySource {
    orders: Vec<OrderExportRow>,
    items: Vec<(DateTime<Utc>, OrderItemExportRow)>,
    ledger: Vec<LedgerExportRow>,
    recorded: Mutex<Vec<ExportRecord>>,
    fail_record: bool,
}

#[async_trait]
impl ExportSource for MemorySource {
    async fn already_exported(
        &self,
        period: ExportPeriod,
        export_type: ExportType,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .recorded
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.period == period && r.export_type == export_type))
    }

    async fn load_rows(
        &self,
        export_type: ExportType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ExportRows, RepositoryError> {
        let within = |at: &DateTime<Utc>| *at >= start && *at < end;
        Ok(match export_type {
            ExportType::Orders => ExportRows::Orders(
                self.orders
                    .iter()
                    .filter(|o| within(&o.created_at))
                    .cloned()
                    .collect(),
            ),
            ExportType::OrderItems => ExportRows::OrderItems(
                self.items
                    .iter()
                    .filter(|(at, _)| within(at))
                    .map(|(_, item)| item.clone())
                    .collect(),
            ),
            ExportType::PointsLedger => ExportRows::PointsLedger(
                self.ledger
                    .iter()
                    .filter(|l| within(&l.created_at))
                    .cloned()
                    .collect(),
            ),
        })
    }

    async fn record(&self, record: &ExportRecord) -> Result<(), RepositoryError> {
        if self.fail_record {
            return Err(RepositoryError::DataCorruption("ledger offline".to_string()));
        }
        self.recorded.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 15, 30, 0).unwrap()
}

fn may() -> ExportPeriod {
    ExportPeriod::new(2024, 5).unwrap()
}

fn order(created_at: DateTime<Utc>) -> OrderExportRow {
    OrderExportRow {
        id: OrderId::new_v4(),
        user_id: UserId::new_v4(),
        user_email: Some("grace@example.com".to_string()),
        status: OrderStatus::Shipped,
        total_points: Points::new(7_500),
        shipping_name: Some("Grace Hopper".to_string()),
        shipping_address: Some("1 Navy Way, Arlington, VA 22201, US".to_string()),
        tracking_number: Some("1Z999AA10123456784".to_string()),
        created_at,
    }
}

fn item(order_id: OrderId) -> OrderItemExportRow {
    OrderItemExportRow {
        id: OrderItemId::new_v4(),
        order_id,
        product_id: Some(ProductId::new_v4()),
        variant_id: None,
        product_name: "Mug \"Classic\"".to_string(),
        variant_name: None,
        quantity: 3,
        points_per_unit: Points::new(2_500),
        total_points: Points::new(7_500),
    }
}

fn ledger(created_at: DateTime<Utc>, delta: i64, reason: &str) -> LedgerExportRow {
    LedgerExportRow {
        id: LedgerEntryId::new_v4(),
        user_id: UserId::new_v4(),
        user_email: None,
        delta: Points::new(delta),
        reason: reason.to_string(),
        order_id: None,
        created_at,
    }
}

fn source() -> MemorySource {
    let may_order = order(at(5, 2));
    let april_order = order(at(4, 30));
    MemorySource {
        items: vec![(at(5, 2), item(may_order.id)), (at(4, 30), item(april_order.id))],
        orders: vec![may_order, april_order],
        ledger: vec![
            ledger(at(5, 1), 10_000, "Welcome bonus"),
            ledger(at(5, 31), -7_500, "Order, with note\nsecond line"),
        ],
        ..MemorySource::default()
    }
}

fn read_records(path: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_writes_one_file_per_type_with_checksums() {
    let dir = scratch_dir("perkshop-export-it");
    let store = LocalDirStore::new(dir.clone());
    let source = source();

    let report = run_monthly_export(&source, &store, may()).await;
    assert_eq!(report.http_status(), 200);

    let recorded = source.recorded.lock().unwrap().clone();
    assert_eq!(recorded.len(), 3);

    for record in &recorded {
        let body = std::fs::read(&record.file_path).unwrap();
        assert_eq!(record.checksum, checksum(&body));
        assert!(record.file_path.ends_with(&may().file_name(record.export_type)));

        let (headers, rows) = read_records(&record.file_path);
        assert_eq!(headers, record.export_type.headers());
        assert_eq!(i32::try_from(rows.len()).unwrap(), record.row_count);
    }

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_only_rows_inside_the_month_are_exported() {
    let dir = scratch_dir("perkshop-export-it");
    let store = LocalDirStore::new(dir.clone());
    let source = source();

    let report = run_monthly_export(&source, &store, may()).await;

    assert_eq!(
        report.outcome(ExportType::Orders),
        Some(&ExportOutcome::Exported {
            path: dir.join("2024-05_orders.csv").display().to_string(),
            rows: 1,
        })
    );

    let (_, rows) = read_records(&dir.join("2024-05_points_ledger.csv").display().to_string());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][3], "10000");
    assert_eq!(rows[0][6], "2024-05-01T15:30:00Z");
    assert_eq!(rows[1][4], "Order, with note\nsecond line");

    let (_, items) = read_records(&dir.join("2024-05_order_items.csv").display().to_string());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0][4], "Mug \"Classic\"");

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_second_run_is_already_exported() {
    let dir = scratch_dir("perkshop-export-it");
    let store = LocalDirStore::new(dir.clone());
    let source = source();

    run_monthly_export(&source, &store, may()).await;
    let first = std::fs::read(dir.join("2024-05_orders.csv")).unwrap();

    let again = run_monthly_export(&source, &store, may()).await;
    assert_eq!(again.http_status(), 200);
    for export_type in ExportType::ALL {
        assert_eq!(again.outcome(export_type), Some(&ExportOutcome::AlreadyExported));
    }
    assert_eq!(std::fs::read(dir.join("2024-05_orders.csv")).unwrap(), first);
    assert_eq!(source.recorded.lock().unwrap().len(), 3);

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_empty_month_is_no_data() {
    let dir = scratch_dir("perkshop-export-it");
    let store = LocalDirStore::new(dir.clone());
    let source = source();

    let report = run_monthly_export(&source, &store, ExportPeriod::new(2023, 1).unwrap()).await;

    assert_eq!(report.http_status(), 200);
    for export_type in ExportType::ALL {
        assert_eq!(report.outcome(export_type), Some(&ExportOutcome::NoData));
    }
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_failed_ledger_write_leaves_file_and_blocks_rerun() {
    let dir = scratch_dir("perkshop-export-it");
    let store = LocalDirStore::new(dir.clone());
    let failing = MemorySource {
        fail_record: true,
        ..source()
    };

    let report = run_monthly_export(&failing, &store, may()).await;
    assert_eq!(report.http_status(), 500);
    assert!(dir.join("2024-05_orders.csv").exists());

    // No rollback: the uploaded file stays and the next run trips over it.
    let retry = run_monthly_export(&source(), &store, may()).await;
    assert_eq!(retry.failures(), 3);
    assert!(matches!(
        retry.outcome(ExportType::Orders),
        Some(ExportOutcome::Failed { error }) if error.contains("2024-05_orders.csv")
    ));

    std::fs::remove_dir_all(dir).unwrap();
}
