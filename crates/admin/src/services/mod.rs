//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login for admins, admin bootstrap, set-password tokens
//! - `cron` - Shared-secret check for the cron endpoint
//! - `email` - Shipping notices and access approvals via SMTP
//! - `exports` - Monthly CSV export job and object storage

pub mod auth;
pub mod cron;
pub mod email;
pub mod exports;

pub use auth::{AdminAuthError, AdminAuthService};
pub use email::{EmailError, EmailService, ShippedEmail};
pub use exports::{ExportSource, ObjectStore, PgExportSource, run_monthly_export};
