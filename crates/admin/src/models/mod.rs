//! Domain models for admin.
//!
//! Row types derive `sqlx::FromRow` and are read with runtime-checked
//! `query_as` calls in [`crate::db`].

pub mod access_request;
pub mod catalog;
pub mod export;
pub mod order;
pub mod session;
pub mod user;

pub use access_request::AccessRequest;
pub use catalog::{Product, Variant};
pub use export::MonthlyExport;
pub use order::{Order, OrderItem, OrderSummary};
pub use session::{CURRENT_ADMIN_KEY, CurrentAdmin};
pub use user::{LedgerEntry, UserSummary};
