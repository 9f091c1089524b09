//! Export ledger and ad-hoc CSV downloads.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::csv::ExportType;

use super::{AdminUserView, render};
use crate::db::ExportRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::MonthlyExport;
use crate::services::exports::CSV_CONTENT_TYPE;
use crate::services::{ExportSource, PgExportSource};
use crate::state::AppState;

/// Download date range. Both ends are inclusive calendar days in UTC.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Exports template.
#[derive(Template)]
#[template(path = "exports/index.html")]
pub struct ExportsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub exports: Vec<MonthlyExport>,
    pub types: &'static [ExportType],
}

/// A resolved download range, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DownloadRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    label: String,
}

fn parse_day(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{field} must be YYYY-MM-DD"))),
        None => Ok(None),
    }
}

impl RangeQuery {
    /// Missing `from` means the beginning of time, missing `to` means now.
    fn resolve(&self, now: DateTime<Utc>) -> Result<DownloadRange> {
        let from = parse_day(self.from.as_deref(), "from")?;
        let to = parse_day(self.to.as_deref(), "to")?;
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(AppError::BadRequest("from is after to".to_string()));
        }

        let start = from.map_or(DateTime::UNIX_EPOCH, |day| {
            day.and_time(NaiveTime::MIN).and_utc()
        });
        let end = match to {
            Some(day) => day
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::BadRequest("to is out of range".to_string()))?
                .and_time(NaiveTime::MIN)
                .and_utc(),
            None => now,
        };
        let label = match (from, to) {
            (None, None) => "all".to_string(),
            (from, to) => format!(
                "{}_to_{}",
                from.map_or_else(|| "start".to_string(), |d| d.to_string()),
                to.map_or_else(|| "now".to_string(), |d| d.to_string())
            ),
        };

        Ok(DownloadRange { start, end, label })
    }
}

/// Monthly export ledger.
///
/// GET /exports
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let exports = ExportRepository::new(state.db()?).list().await?;

    Ok(render(&ExportsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/exports".to_string(),
        exports,
        types: &ExportType::ALL,
    }))
}

/// Ad-hoc CSV download of one export type.
///
/// GET /exports/{type}
#[instrument(skip(admin, state))]
pub async fn download(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(export_type): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Response> {
    let export_type: ExportType = export_type
        .parse()
        .map_err(|_| AppError::NotFound(format!("export type {export_type}")))?;
    let range = range.resolve(Utc::now())?;
    let pool = state.db()?;

    let rows = PgExportSource::new(pool.clone())
        .load_rows(export_type, range.start, range.end)
        .await?;
    tracing::info!(
        %export_type,
        rows = rows.len(),
        range = %range.label,
        admin_id = %admin.id,
        "Ad-hoc export downloaded"
    );

    let disposition = format!(
        "attachment; filename=\"perkshop_{}_{}.csv\"",
        export_type.as_str(),
        range.label
    );
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rows.to_csv(),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn query(from: Option<&str>, to: Option<&str>) -> RangeQuery {
        RangeQuery {
            from: from.map(String::from),
            to: to.map(String::from),
        }
    }

    #[test]
    fn test_open_range_covers_everything_until_now() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        let range = query(None, Some("")).resolve(now).unwrap();
        assert_eq!(range.start, DateTime::UNIX_EPOCH);
        assert_eq!(range.end, now);
        assert_eq!(range.label, "all");
    }

    #[test]
    fn test_to_is_inclusive() {
        let now = Utc::now();
        let range = query(Some("2026-01-01"), Some("2026-01-31"))
            .resolve(now)
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(range.label, "2026-01-01_to_2026-01-31");
    }

    #[test]
    fn test_half_open_label() {
        let range = query(Some("2026-01-01"), None).resolve(Utc::now()).unwrap();
        assert_eq!(range.label, "2026-01-01_to_now");
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!(query(Some("01/02/2026"), None).resolve(Utc::now()).is_err());
        assert!(
            query(Some("2026-02-01"), Some("2026-01-01"))
                .resolve(Utc::now())
                .is_err()
        );
    }
}
