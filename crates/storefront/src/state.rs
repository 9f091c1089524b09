//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use perkshop_core::ConversionRate;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::models::Product;
use crate::services::cart::CartHub;
use crate::services::email::EmailService;

/// How long the active catalog listing is cached.
const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("email transport: {0}")]
    Email(#[from] perkshop_core::server::MailError),
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
    config: StorefrontConfig,
    pool: Option<PgPool>,
    email: Option<EmailService>,
    catalog_cache: Cache<(), Arc<Vec<Product>>>,
    cart_hub: CartHub,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Without a pool the storefront runs in dev mode. Email is only
    /// configured when SMTP settings exist and a database is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: StorefrontConfig, pool: Option<PgPool>) -> Result<Self, StateError> {
        let email = match (&config.smtp, &pool) {
            (Some(smtp), Some(_)) => Some(EmailService::new(smtp)?),
            _ => None,
        };

        let catalog_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATALOG_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                catalog_cache,
                cart_hub: CartHub::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
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

    /// Whether the storefront runs without a database.
    #[must_use]
    pub fn is_dev_mode(&self) -> bool {
        self.inner.pool.is_none()
    }

    /// The email service, if email is enabled.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// USD-to-points conversion rate.
    #[must_use]
    pub fn rate(&self) -> ConversionRate {
        self.inner.config.points_per_dollar
    }

    /// Cache of the active product listing.
    #[must_use]
    pub fn catalog_cache(&self) -> &Cache<(), Arc<Vec<Product>>> {
        &self.inner.catalog_cache
    }

    /// Per-session cart broadcast channels.
    #[must_use]
    pub fn cart_hub(&self) -> &CartHub {
        &self.inner.cart_hub
    }
}
