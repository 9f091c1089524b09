//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `STOREFRONT_BASE_URL` - Storefront URL, used for links in employee emails
//!
//! ## Optional
//! - `DATABASE_URL` - `PostgreSQL` connection string. When unset the admin
//!   runs in dev mode: demo login, empty dashboard, everything else 503.
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `POINTS_PER_DOLLAR` - USD-to-points conversion rate (default: 100)
//! - `CRON_SECRET` - Shared secret for `POST /api/cron/monthly-export`.
//!   When unset the endpoint answers 503.
//! - `SMTP_*` - Outgoing mail, see [`SmtpConfig::from_env`]
//! - `SENTRY_*`, `LOG_FORMAT` - See [`Telemetry::from_env`]
//!
//! ## Export storage
//! - `EXPORT_STORAGE_URL` + `EXPORT_STORAGE_KEY` - Hosted bucket endpoint and
//!   service key. Both or neither.
//! - `EXPORT_BUCKET` - Bucket name (default: exports)
//! - `EXPORT_DIR` - Local directory used when no bucket is configured
//!   (default: ./exports)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;

use perkshop_core::ConversionRate;
use perkshop_core::server::env;
use perkshop_core::server::{SmtpConfig, Telemetry};

pub use perkshop_core::server::ConfigError;

const DEFAULT_EXPORT_BUCKET: &str = "exports";
const DEFAULT_EXPORT_DIR: &str = "./exports";

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `None` means dev mode.
    pub database_url: Option<SecretString>,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    /// Storefront base URL for links in employee emails.
    pub storefront_base_url: String,
    pub session_secret: SecretString,
    pub points_per_dollar: ConversionRate,
    /// Shared secret for the cron endpoint; `None` disables it.
    pub cron_secret: Option<SecretString>,
    pub export_storage: ExportStorageConfig,
    /// `None` disables email.
    pub smtp: Option<SmtpConfig>,
    pub telemetry: Telemetry,
}

/// Export file destination. `Debug` redacts the bucket key.
#[derive(Clone)]
pub enum ExportStorageConfig {
    /// Hosted object storage reached over HTTP.
    Bucket {
        /// Storage API base URL, without a trailing slash
        url: String,
        /// Service key sent as a bearer token
        key: SecretString,
        bucket: String,
    },
    /// A directory on local disk.
    LocalDir(PathBuf),
}

impl std::fmt::Debug for ExportStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bucket { url, bucket, .. } => f
                .debug_struct("Bucket")
                .field("url", url)
                .field("key", &"[REDACTED]")
                .field("bucket", bucket)
                .finish(),
            Self::LocalDir(path) => f.debug_tuple("LocalDir").field(path).finish(),
        }
    }
}

impl ExportStorageConfig {
    /// Read `EXPORT_STORAGE_URL`, `EXPORT_STORAGE_KEY`, `EXPORT_BUCKET` and
    /// `EXPORT_DIR`.
    ///
    /// # Errors
    ///
    /// Returns an error when only one of URL and key is set, or the key is
    /// weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        match (
            env::optional("EXPORT_STORAGE_URL"),
            env::optional_secret("EXPORT_STORAGE_KEY")?,
        ) {
            (Some(url), Some(key)) => Ok(Self::Bucket {
                url: url.trim_end_matches('/').to_string(),
                key,
                bucket: env::or_default("EXPORT_BUCKET", DEFAULT_EXPORT_BUCKET),
            }),
            (None, None) => Ok(Self::LocalDir(PathBuf::from(env::or_default(
                "EXPORT_DIR",
                DEFAULT_EXPORT_DIR,
            )))),
            _ => Err(ConfigError::InvalidEnvVar(
                "EXPORT_STORAGE_*".to_string(),
                "Both EXPORT_STORAGE_URL and EXPORT_STORAGE_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration, reading `.env` first when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        env::load_dotenv();

        let mut telemetry = Telemetry::from_env()?;
        // Admin events may carry employee details; the panel is internal.
        telemetry.send_default_pii = true;

        Ok(Self {
            database_url: env::optional("DATABASE_URL").map(SecretString::from),
            host: env::parse_or("ADMIN_HOST", "127.0.0.1")?,
            port: env::parse_or("ADMIN_PORT", "3001")?,
            base_url: env::required("ADMIN_BASE_URL")?,
            storefront_base_url: env::required("STOREFRONT_BASE_URL")?,
            session_secret: env::session_secret("ADMIN_SESSION_SECRET")?,
            points_per_dollar: env::parse_or("POINTS_PER_DOLLAR", "100")?,
            cron_secret: env::optional_secret("CRON_SECRET")?,
            export_storage: ExportStorageConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            telemetry,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the admin runs without a database.
    #[must_use]
    pub const fn is_dev_mode(&self) -> bool {
        self.database_url.is_none()
    }

    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Minimal configuration for dev mode and tests.
    #[must_use]
    pub fn dev(export_dir: PathBuf) -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            storefront_base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("dev-mode-admin-key-0123456789abcdef"),
            points_per_dollar: ConversionRate::DEFAULT,
            cron_secret: None,
            export_storage: ExportStorageConfig::LocalDir(export_dir),
            smtp: None,
            telemetry: Telemetry::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_storage_debug_redacts_key() {
        let config = ExportStorageConfig::Bucket {
            url: "https://storage.corp.io".to_string(),
            key: SecretString::from("sk-live-9f8e7d6c5b4a"),
            bucket: "exports".to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("storage.corp.io"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-live"));
    }

    #[test]
    fn test_dev_config() {
        let config = AdminConfig::dev(PathBuf::from("/tmp/exports"));
        assert!(config.is_dev_mode());
        assert!(!config.is_https());
        assert!(config.cron_secret.is_none());
        assert_eq!(config.socket_addr().port(), 3001);
    }
}
