//! Tracing subscriber and Sentry client setup.

use std::borrow::Cow;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use super::env::{self, ConfigError};

/// Logging and error tracking settings.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    /// Attach request bodies and user details to Sentry events.
    pub send_default_pii: bool,
    /// One JSON object per line instead of human-readable text.
    pub log_json: bool,
}

impl Telemetry {
    /// Read `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE` (1.0),
    /// `SENTRY_TRACES_SAMPLE_RATE` (0.0) and `LOG_FORMAT`.
    ///
    /// # Errors
    ///
    /// Returns an error for a sample rate outside `0.0..=1.0`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            sentry_dsn: env::optional("SENTRY_DSN"),
            sentry_environment: env::optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env::sample_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env::sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
            send_default_pii: false,
            log_json: env::optional("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Start Sentry (when a DSN is set) and install the global subscriber.
    ///
    /// `default_filter` applies when `RUST_LOG` is unset. Keep the returned
    /// guard alive for the life of the process so events are flushed.
    pub fn init(
        &self,
        release: Option<Cow<'static, str>>,
        default_filter: &str,
    ) -> Option<sentry::ClientInitGuard> {
        let guard = self.sentry_dsn.as_deref().map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release,
                    environment: self.sentry_environment.clone().map(Cow::Owned),
                    sample_rate: self.sentry_sample_rate,
                    traces_sample_rate: self.sentry_traces_sample_rate,
                    send_default_pii: self.send_default_pii,
                    attach_stacktrace: true,
                    ..Default::default()
                },
            ))
        });

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
        let json = self
            .log_json
            .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
        let text = (!self.log_json).then(tracing_subscriber::fmt::layer);

        tracing_subscriber::registry()
            .with(filter)
            .with(json)
            .with(text)
            .with(sentry_tracing::layer().event_filter(sentry_filter))
            .init();

        if guard.is_some() {
            tracing::info!("Sentry initialized");
        }
        guard
    }
}

/// Warnings and errors become Sentry events; info and debug ride along as
/// breadcrumbs.
fn sentry_filter(metadata: &tracing::Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => EventFilter::Breadcrumb,
        tracing::Level::TRACE => EventFilter::Ignore,
    }
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
///
/// # Panics
///
/// Panics if the signal handlers cannot be installed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
