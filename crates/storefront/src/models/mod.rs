//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and are read with runtime-checked
//! `query_as` calls in [`crate::db`].

pub mod catalog;
pub mod order;
pub mod points;
pub mod profile;
pub mod session;

pub use catalog::{Product, Variant};
pub use order::{Order, OrderItem};
pub use points::LedgerEntry;
pub use profile::{Profile, ShippingAddress};
pub use session::{CART_CHANNEL_KEY, CURRENT_USER_KEY, CurrentUser};
