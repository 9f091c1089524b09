//! PerkShop Core - Shared domain library.
//!
//! This crate provides the domain logic used across all PerkShop components:
//! - `storefront` - Employee-facing rewards store
//! - `admin` - Administration panel and export jobs
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The domain modules perform no network or database I/O. Storage for the
//! cart is abstracted behind [`cart::CartStorage`], so the same store logic
//! runs against a session blob on the server or an in-memory map in tests.
//! The `server` feature adds the process plumbing both web binaries share.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, points, and status enums
//! - [`cart`] - Cart store, storage backends, and price enrichment
//! - [`reporting`] - Ledger and order aggregates for dashboards
//! - [`csv`] - CSV encoding and the fixed export schemas
//! - [`export`] - Monthly export periods and outcome reporting
//! - [`tracking`] - Carrier detection and tracking URLs
//! - [`password`] - Argon2id password hashing
//! - `server` - Env config, SMTP mailer, tracing and Sentry (feature `server`)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod csv;
pub mod export;
pub mod password;
pub mod reporting;
#[cfg(feature = "server")]
pub mod server;
pub mod tracking;
pub mod types;

pub use types::*;
