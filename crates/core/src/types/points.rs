//! Points and the USD-to-points conversion rate.
//!
//! Product prices are stored in USD and converted to points at render time.
//! Conversion rounds to the nearest whole point at each step (base price and
//! variant adjustment separately), so totals are sums of already-rounded
//! unit values.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A signed amount of points.
///
/// Positive values are credits (issued points), negative values are debits
/// (redemptions). Balances are the sum of all ledger deltas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Points(i64);

impl Points {
    /// Zero points.
    pub const ZERO: Self = Self(0);

    /// Create a points amount.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Whether this is a credit (strictly positive).
    #[must_use]
    pub const fn is_credit(self) -> bool {
        self.0 > 0
    }

    /// Whether this is a debit (strictly negative).
    #[must_use]
    pub const fn is_debit(self) -> bool {
        self.0 < 0
    }
}

impl Add for Points {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Points {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Points {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<u32> for Points {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(rhs)))
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Points> for Points {
    fn sum<I: Iterator<Item = &'a Points>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Points> for i64 {
    fn from(points: Points) -> Self {
        points.0
    }
}

/// Formats with thousands separators, e.g. `12,500` or `-300`.
impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if self.0 < 0 {
            write!(f, "-{grouped}")
        } else {
            f.write_str(&grouped)
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Points {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Points {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Points {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Errors that can occur when parsing a [`ConversionRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionRateError {
    /// The input is not a decimal number.
    #[error("conversion rate must be a decimal number: {0}")]
    NotANumber(String),
    /// The rate is zero or negative.
    #[error("conversion rate must be greater than zero")]
    NotPositive,
}

/// Points awarded per US dollar of list price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionRate(Decimal);

impl ConversionRate {
    /// The default rate: 100 points per dollar.
    pub const DEFAULT: Self = Self(Decimal::ONE_HUNDRED);

    /// Create a conversion rate.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionRateError::NotPositive`] for zero or negative rates.
    pub fn new(rate: Decimal) -> Result<Self, ConversionRateError> {
        if rate <= Decimal::ZERO {
            return Err(ConversionRateError::NotPositive);
        }
        Ok(Self(rate))
    }

    /// The rate as a decimal.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Convert a USD amount to points, rounding half toward positive infinity.
    ///
    /// Negative amounts (discounting variant adjustments) round the same way,
    /// so `-2.5` becomes `-2`.
    ///
    /// ```
    /// use perkshop_core::{ConversionRate, Points};
    /// use rust_decimal::Decimal;
    ///
    /// let rate = ConversionRate::DEFAULT;
    /// assert_eq!(rate.to_points(Decimal::new(25, 0)), Points::new(2500));
    /// assert_eq!(rate.to_points(Decimal::new(12355, 4)), Points::new(124));
    /// ```
    #[must_use]
    pub fn to_points(self, usd: Decimal) -> Points {
        let scaled = usd * self.0;
        let rounded = (scaled + Decimal::new(5, 1)).floor();
        rounded.to_i64().map_or_else(
            || {
                if rounded.is_sign_negative() {
                    Points(i64::MIN)
                } else {
                    Points(i64::MAX)
                }
            },
            Points,
        )
    }
}

impl Default for ConversionRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for ConversionRate {
    type Err = ConversionRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rate = Decimal::from_str(s.trim())
            .map_err(|_| ConversionRateError::NotANumber(s.to_string()))?;
        Self::new(rate)
    }
}

impl fmt::Display for ConversionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_points_example_price() {
        let rate = ConversionRate::DEFAULT;
        assert_eq!(rate.to_points(Decimal::new(25, 0)), Points::new(2500));
    }

    #[test]
    fn test_to_points_rounds_half_up() {
        let rate: ConversionRate = "10".parse().unwrap();
        assert_eq!(rate.to_points(Decimal::new(125, 2)), Points::new(13));
        assert_eq!(rate.to_points(Decimal::new(124, 2)), Points::new(12));
    }

    #[test]
    fn test_to_points_negative_half_rounds_toward_positive() {
        let rate: ConversionRate = "1".parse().unwrap();
        assert_eq!(rate.to_points(Decimal::new(-25, 1)), Points::new(-2));
        assert_eq!(rate.to_points(Decimal::new(-26, 1)), Points::new(-3));
    }

    #[test]
    fn test_rate_rejects_non_positive() {
        assert_eq!(
            "0".parse::<ConversionRate>(),
            Err(ConversionRateError::NotPositive)
        );
        assert!(matches!(
            "lots".parse::<ConversionRate>(),
            Err(ConversionRateError::NotANumber(_))
        ));
    }

    #[test]
    fn test_points_display_groups_thousands() {
        assert_eq!(Points::new(0).to_string(), "0");
        assert_eq!(Points::new(999).to_string(), "999");
        assert_eq!(Points::new(7500).to_string(), "7,500");
        assert_eq!(Points::new(-1_234_567).to_string(), "-1,234,567");
    }

    #[test]
    fn test_points_arithmetic() {
        let unit = Points::new(2500);
        assert_eq!(unit * 3, Points::new(7500));
        assert_eq!(-unit, Points::new(-2500));
        let total: Points = [Points::new(5), Points::new(-2)].iter().sum();
        assert_eq!(total, Points::new(3));
    }
}
