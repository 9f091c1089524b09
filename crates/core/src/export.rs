//! Monthly export periods and job outcomes.
//!
//! The monthly job produces one CSV per [`ExportType`] for the previous
//! calendar month. Each type runs independently: one failing does not roll
//! back the others, and the overall [`ExportReport`] says whether the run
//! succeeded fully, partially, or not at all.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::csv::ExportType;

/// A calendar month in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExportPeriod {
    year: i32,
    month: u32,
}

/// Errors from parsing or constructing an [`ExportPeriod`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("period must look like YYYY-MM: {0}")]
    Format(String),
    #[error("month must be between 1 and 12, got {0}")]
    Month(u32),
}

impl ExportPeriod {
    /// Build a period.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::Month`] when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if month == 0 || month > 12 {
            return Err(PeriodError::Month(month));
        }
        Ok(Self { year, month })
    }

    /// The calendar month before the one containing `now`.
    #[must_use]
    pub fn previous_month(now: DateTime<Utc>) -> Self {
        if now.month() == 1 {
            Self {
                year: now.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: now.year(),
                month: now.month() - 1,
            }
        }
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// `YYYY-MM`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Half-open UTC range `[start, end)` covering the month.
    #[must_use]
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        (
            month_start(self.year, self.month),
            month_start(next_year, next_month),
        )
    }

    /// Object name for an export of this period, e.g. `2024-05_orders.csv`.
    #[must_use]
    pub fn file_name(&self, export_type: ExportType) -> String {
        format!("{}_{}.csv", self.label(), export_type.as_str())
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(DateTime::<Utc>::MIN_UTC, |naive| Utc.from_utc_datetime(&naive))
}

impl fmt::Display for ExportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for ExportPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .filter(|(y, m)| y.len() == 4 && m.len() == 2)
            .ok_or_else(|| PeriodError::Format(s.to_string()))?;
        let year = year
            .parse()
            .map_err(|_| PeriodError::Format(s.to_string()))?;
        let month = month
            .parse()
            .map_err(|_| PeriodError::Format(s.to_string()))?;
        Self::new(year, month)
    }
}

impl Serialize for ExportPeriod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for ExportPeriod {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Result of exporting one type for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// File written and recorded.
    Exported { path: String, rows: usize },
    /// The ledger already has this period and type.
    AlreadyExported,
    /// No rows fell inside the period.
    NoData,
    /// Any step failed.
    Failed { error: String },
}

impl ExportOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcomes of one monthly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub period: ExportPeriod,
    pub results: Vec<(ExportType, ExportOutcome)>,
}

impl ExportReport {
    #[must_use]
    pub const fn new(period: ExportPeriod, results: Vec<(ExportType, ExportOutcome)>) -> Self {
        Self { period, results }
    }

    /// Number of failed types.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .count()
    }

    /// HTTP status for the run: 200 when nothing failed, 207 when some types
    /// failed, 500 when every type failed.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self.failures() {
            0 => 200,
            n if n == self.results.len() => 500,
            _ => 207,
        }
    }

    /// Outcome for a given type.
    #[must_use]
    pub fn outcome(&self, export_type: ExportType) -> Option<&ExportOutcome> {
        self.results
            .iter()
            .find(|(t, _)| *t == export_type)
            .map(|(_, outcome)| outcome)
    }
}
