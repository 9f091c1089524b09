//! Monthly export command.
//!
//! Runs the same job as `POST /api/cron/monthly-export`, writing to the
//! storage configured by `EXPORT_STORAGE_URL`/`EXPORT_STORAGE_KEY` or
//! `EXPORT_DIR`.

use chrono::Utc;

use perkshop_admin::config::ExportStorageConfig;
use perkshop_admin::services::exports::from_config;
use perkshop_admin::services::{PgExportSource, run_monthly_export};
use perkshop_core::export::ExportPeriod;

use super::{CommandError, connect};

/// Run the job and print the report as JSON.
///
/// # Errors
///
/// Returns an error if storage or the database cannot be set up, or if any
/// export type failed.
pub async fn run(period: Option<ExportPeriod>) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();
    let store = from_config(&ExportStorageConfig::from_env()?)?;
    let pool = connect().await?;

    let period = period.unwrap_or_else(|| ExportPeriod::previous_month(Utc::now()));
    let report = run_monthly_export(&PgExportSource::new(pool), store.as_ref(), period).await;

    let json = serde_json::to_string_pretty(&report)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    match report.failures() {
        0 => Ok(()),
        n => Err(CommandError::Invalid(format!(
            "{n} of {} export types failed",
            report.results.len()
        ))),
    }
}
