//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `DATABASE_URL` - `PostgreSQL` connection string. When unset the storefront
//!   runs in dev mode: mock catalog, no writes, no email.
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `POINTS_PER_DOLLAR` - USD-to-points conversion rate (default: 100)
//! - `ADMIN_NOTIFICATION_EMAILS` - Comma-separated admin addresses for new
//!   order and access request notifications
//! - `SMTP_*` - Outgoing mail, see [`SmtpConfig::from_env`]
//! - `SENTRY_*`, `LOG_FORMAT` - See [`Telemetry::from_env`]

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;

use perkshop_core::server::env;
use perkshop_core::server::{SmtpConfig, Telemetry};
use perkshop_core::{ConversionRate, Email};

pub use perkshop_core::server::ConfigError;

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `None` means dev mode.
    pub database_url: Option<SecretString>,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL, used for links in emails and the cookie's `Secure` flag.
    pub base_url: String,
    pub session_secret: SecretString,
    pub points_per_dollar: ConversionRate,
    /// Recipients of new order and access request notifications.
    pub admin_notification_emails: Vec<Email>,
    /// `None` disables email.
    pub smtp: Option<SmtpConfig>,
    pub telemetry: Telemetry,
}

impl StorefrontConfig {
    /// Load configuration, reading `.env` first when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        env::load_dotenv();

        Ok(Self {
            database_url: env::optional("DATABASE_URL").map(SecretString::from),
            host: env::parse_or("STOREFRONT_HOST", "127.0.0.1")?,
            port: env::parse_or("STOREFRONT_PORT", "3000")?,
            base_url: env::required("STOREFRONT_BASE_URL")?,
            session_secret: env::session_secret("STOREFRONT_SESSION_SECRET")?,
            points_per_dollar: env::parse_or("POINTS_PER_DOLLAR", "100")?,
            admin_notification_emails: env::email_list("ADMIN_NOTIFICATION_EMAILS")?,
            smtp: SmtpConfig::from_env()?,
            telemetry: Telemetry::from_env()?,
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront runs without a database.
    #[must_use]
    pub const fn is_dev_mode(&self) -> bool {
        self.database_url.is_none()
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Minimal configuration for dev mode and tests.
    #[must_use]
    pub fn dev(base_url: &str) -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("dev-mode-session-key-0123456789abcdef"),
            points_per_dollar: ConversionRate::DEFAULT,
            admin_notification_emails: Vec::new(),
            smtp: None,
            telemetry: Telemetry::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_config_socket_addr() {
        let config = StorefrontConfig::dev("http://localhost:3000");
        assert!(config.is_dev_mode());
        assert!(!config.is_https());
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_https_base_url_marks_cookies_secure() {
        assert!(StorefrontConfig::dev("https://perks.corp.io").is_https());
    }
}
