//! Process plumbing shared by the storefront and admin binaries.
//!
//! Enabled by the `server` feature. Covers environment parsing with secret
//! checks, the SMTP mailer, and tracing plus Sentry setup.

pub mod env;
pub mod mail;
pub mod telemetry;

pub use env::ConfigError;
pub use mail::{MailError, Mailer, SmtpConfig};
pub use telemetry::{Telemetry, shutdown_signal};
