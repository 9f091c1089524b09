//! Custom Askama template filters.
//!
//! Dates render in UTC. Point deltas render with an explicit sign so ledger
//! tables read as credits and debits.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};

use perkshop_core::Points;

/// Values the date filters accept, however deeply the template borrows them.
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

/// Values the points filters accept.
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

fn signed(points: Points) -> String {
    if points.is_credit() {
        format!("+{points}")
    } else {
        points.to_string()
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

/// `Jan 5, 2025`
#[askama::filter_fn]
pub fn short_date(value: impl AsUtc, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.as_utc().format("%b %-d, %Y").to_string())
}

/// `Jan 5, 2025 14:03`
#[askama::filter_fn]
pub fn date_time(value: impl AsUtc, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.as_utc().format("%b %-d, %Y %H:%M").to_string())
}

/// `+1,000` for credits, `-250` for debits.
#[askama::filter_fn]
pub fn signed_points(value: impl AsPoints, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(signed(value.as_points()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed() {
        assert_eq!(signed(Points::new(1_000)), "+1,000");
        assert_eq!(signed(Points::new(-250)), "-250");
        assert_eq!(signed(Points::ZERO), "0");
    }

    #[test]
    fn test_borrowed_values_unwrap() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!((&&at).as_utc(), at);
        assert_eq!((&Points::new(5)).as_points(), Points::new(5));
    }
}
