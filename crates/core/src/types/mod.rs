//! Core types for PerkShop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod points;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use points::{ConversionRate, ConversionRateError, Points};
pub use status::{AccessRequestStatus, OrderStatus, ParseStatusError, UserRole};
