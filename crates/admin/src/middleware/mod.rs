//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions; `PostgreSQL` store, memory in dev mode)
//! 4. Security headers (stricter CSP for admin)
//!
//! Authentication is enforced per handler by the [`RequireAdminAuth`]
//! extractor.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdminAuth, RequireAdminAuth, end_admin_session, start_admin_session};
pub use security_headers::security_headers_middleware;
pub use session::with_session_layer;
