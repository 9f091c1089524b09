//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use perkshop_core::ConversionRate;

use crate::config::AdminConfig;
use crate::error::AppError;
use crate::services::email::EmailService;
use crate::services::exports::{self, ObjectStore, StorageError};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email transport: {0}")]
    Email(#[from] perkshop_core::server::MailError),

    #[error("export storage: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: Option<PgPool>,
    email: Option<EmailService>,
    export_store: Box<dyn ObjectStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Without a pool the admin runs in dev mode. Email is only configured
    /// when SMTP settings exist and a database is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay or export storage cannot be
    /// configured.
    pub fn new(config: AdminConfig, pool: Option<PgPool>) -> Result<Self, StateError> {
        let email = match (&config.smtp, &pool) {
            (Some(smtp), Some(_)) => Some(EmailService::new(smtp)?),
            _ => None,
        };
        let export_store = exports::from_config(&config.export_storage)?;

        Ok(Self::with_store(config, pool, email, export_store))
    }

    /// Create state with an explicit export store.
    #[must_use]
    pub fn with_store(
        config: AdminConfig,
        pool: Option<PgPool>,
        email: Option<EmailService>,
        export_store: Box<dyn ObjectStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                export_store,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The connection pool, if a database is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// The connection pool, or `DevModeReadOnly` in dev mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DevModeReadOnly` when no database is configured.
    pub fn db(&self) -> Result<&PgPool, AppError> {
        self.pool().ok_or(AppError::DevModeReadOnly)
    }

    /// Whether the admin runs without a database.
    #[must_use]
    pub fn is_dev_mode(&self) -> bool {
        self.inner.pool.is_none()
    }

    /// The email service, if email is enabled.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Where monthly export files go.
    #[must_use]
    pub fn export_store(&self) -> &dyn ObjectStore {
        self.inner.export_store.as_ref()
    }

    /// USD-to-points conversion rate.
    #[must_use]
    pub fn rate(&self) -> ConversionRate {
        self.inner.config.points_per_dollar
    }
}
