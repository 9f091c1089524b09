//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password login and the reset-token flow
//! - `cart` - Session-backed cart and cross-tab broadcast
//! - `catalog` - Cached catalog reads and cart pricing
//! - `checkout` - Transactional order placement
//! - `email` - Transactional email (SMTP)

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
