//! Scheduled job endpoints.
//!
//! Called by the platform scheduler, not by browsers: no session, a shared
//! secret in the `x-cron-secret` header instead.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::export::ExportPeriod;

use crate::services::cron::{CRON_SECRET_HEADER, verify_cron_secret};
use crate::services::{PgExportSource, run_monthly_export};
use crate::state::AppState;

/// Optional period override for backfills.
#[derive(Debug, Deserialize)]
pub struct MonthlyExportQuery {
    pub period: Option<ExportPeriod>,
}

/// Run the monthly export for the previous month.
///
/// POST /api/cron/monthly-export
///
/// Answers 503 when no secret is configured or no database is attached,
/// 401 on a missing or wrong secret, otherwise the report with 200, 207 or
/// 500.
#[instrument(skip(state, headers))]
pub async fn monthly_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MonthlyExportQuery>,
) -> Response {
    let Some(expected) = state.config().cron_secret.as_ref() else {
        tracing::warn!("Cron endpoint called but CRON_SECRET is not set");
        return (StatusCode::SERVICE_UNAVAILABLE, "Cron is not configured").into_response();
    };

    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_cron_secret(expected.expose_secret(), provided) {
        tracing::warn!("Cron endpoint called with a bad secret");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let Some(pool) = state.pool() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "No database configured").into_response();
    };

    let period = query
        .period
        .unwrap_or_else(|| ExportPeriod::previous_month(Utc::now()));
    let source = PgExportSource::new(pool.clone());
    let report = run_monthly_export(&source, state.export_store(), period).await;

    let status =
        StatusCode::from_u16(report.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use perkshop_core::csv::ExportType;
    use perkshop_core::export::{ExportOutcome, ExportReport};

    use super::*;

    #[test]
    fn test_report_json_shape() {
        let period = ExportPeriod::new(2026, 9).unwrap();
        let report = ExportReport::new(
            period,
            vec![
                (
                    ExportType::Orders,
                    ExportOutcome::Exported {
                        path: "exports/2026-09_orders.csv".to_string(),
                        rows: 3,
                    },
                ),
                (ExportType::OrderItems, ExportOutcome::NoData),
                (
                    ExportType::PointsLedger,
                    ExportOutcome::Failed {
                        error: "upload rejected".to_string(),
                    },
                ),
            ],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["period"], "2026-09");
        assert_eq!(json["results"][0][0], "orders");
        assert_eq!(json["results"][0][1]["status"], "exported");
        assert_eq!(json["results"][0][1]["rows"], 3);
        assert_eq!(json["results"][1][1]["status"], "no_data");
        assert_eq!(json["results"][2][1]["error"], "upload rejected");
        assert_eq!(report.http_status(), 207);
    }

    #[test]
    fn test_period_override_parses() {
        let query: MonthlyExportQuery =
            serde_json::from_value(serde_json::json!({ "period": "2025-12" })).unwrap();
        assert_eq!(query.period, Some(ExportPeriod::new(2025, 12).unwrap()));
    }
}
