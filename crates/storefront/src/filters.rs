//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};

use perkshop_core::Points;

/// Timestamps the date filter accepts, at any borrow depth.
pub trait AsUtc {
    fn as_utc(&self) -> DateTime<Utc>;
}

impl AsUtc for DateTime<Utc> {
    fn as_utc(&self) -> DateTime<Utc> {
        *self
    }
}

impl<T: AsUtc + ?Sized> AsUtc for &T {
    fn as_utc(&self) -> DateTime<Utc> {
        (**self).as_utc()
    }
}

/// Point amounts the delta filter accepts, at any borrow depth.
pub trait AsPoints {
    fn as_points(&self) -> Points;
}

impl AsPoints for Points {
    fn as_points(&self) -> Points {
        *self
    }
}

impl<T: AsPoints + ?Sized> AsPoints for &T {
    fn as_points(&self) -> Points {
        (**self).as_points()
    }
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(Utc::now().year())
}

/// Order and ledger dates, e.g. `Mar 9, 2025`.
#[askama::filter_fn]
pub fn short_date(value: impl AsUtc, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.as_utc().format("%b %-d, %Y").to_string())
}

/// Ledger deltas with an explicit plus on credits.
#[askama::filter_fn]
pub fn signed_points(value: impl AsPoints, _env: &dyn askama::Values) -> askama::Result<String> {
    let points = value.as_points();
    Ok(if points.is_credit() {
        format!("+{points}")
    } else {
        points.to_string()
    })
}
