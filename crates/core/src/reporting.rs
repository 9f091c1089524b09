//! Aggregates for the admin dashboard and reports page.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::{Points, ProductId};

/// Issued and redeemed totals over a set of ledger deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PointsSummary {
    /// Sum of positive deltas.
    pub issued: Points,
    /// Absolute sum of negative deltas.
    pub redeemed: Points,
}

impl PointsSummary {
    /// Partition deltas by sign and sum each side.
    pub fn from_deltas<I>(deltas: I) -> Self
    where
        I: IntoIterator<Item = Points>,
    {
        deltas
            .into_iter()
            .fold(Self::default(), |mut summary, delta| {
                if delta.is_credit() {
                    summary.issued += delta;
                } else if delta.is_debit() {
                    summary.redeemed += delta.abs();
                }
                summary
            })
    }

    /// Points still outstanding (issued minus redeemed).
    #[must_use]
    pub fn outstanding(&self) -> Points {
        self.issued - self.redeemed
    }

    /// Redeemed divided by issued, or `0.0` when nothing was issued.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn redemption_rate(&self) -> f64 {
        if self.issued.value() == 0 {
            return 0.0;
        }
        self.redeemed.value() as f64 / self.issued.value() as f64
    }

    /// Redemption rate as a whole percentage for display.
    #[must_use]
    pub fn redemption_percent(&self) -> String {
        format!("{:.1}%", self.redemption_rate() * 100.0)
    }
}

/// Mean order total rounded to the nearest point (halves round up).
///
/// Returns zero for an empty slice.
#[must_use]
pub fn average_order_value(totals: &[Points]) -> Points {
    if totals.is_empty() {
        return Points::ZERO;
    }
    let sum: Decimal = totals.iter().map(|t| Decimal::from(t.value())).sum();
    let mean = sum / Decimal::from(totals.len());
    let rounded = (mean + Decimal::new(5, 1)).floor();
    Points::new(rounded.to_i64().unwrap_or_default())
}

/// One ordered line, as read for top-product ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoldItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
}

/// A product ranked by units sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u64,
}

/// Products with the most units sold, highest first.
///
/// Quantities are summed per product; ties keep the order in which each
/// product was first encountered. The first name seen for a product is used.
#[must_use]
pub fn top_products(items: &[SoldItem], limit: usize) -> Vec<TopProduct> {
    let mut index: HashMap<ProductId, usize> = HashMap::new();
    let mut ranked: Vec<TopProduct> = Vec::new();

    for item in items {
        if let Some(entry) = index
            .get(&item.product_id)
            .and_then(|&pos| ranked.get_mut(pos))
        {
            entry.quantity += u64::from(item.quantity);
        } else {
            index.insert(item.product_id, ranked.len());
            ranked.push(TopProduct {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: u64::from(item.quantity),
            });
        }
    }

    // `sort_by` is stable, which keeps encounter order among ties.
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock_uuid;

    fn sold(n: u128, name: &str, quantity: u32) -> SoldItem {
        SoldItem {
            product_id: ProductId::from_uuid(mock_uuid(n)),
            product_name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_points_summary_partitions_by_sign() {
        let summary = PointsSummary::from_deltas(
            [1000, -300, 0, 500, -200].into_iter().map(Points::new),
        );
        assert_eq!(summary.issued, Points::new(1500));
        assert_eq!(summary.redeemed, Points::new(500));
        assert_eq!(summary.outstanding(), Points::new(1000));
        assert!((summary.redemption_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(summary.redemption_percent(), "33.3%");
    }

    #[test]
    fn test_redemption_rate_zero_when_nothing_issued() {
        let summary = PointsSummary::from_deltas([Points::new(-50)]);
        assert!(summary.redemption_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_order_value_rounds_half_up() {
        assert_eq!(average_order_value(&[]), Points::ZERO);
        assert_eq!(
            average_order_value(&[Points::new(1), Points::new(2)]),
            Points::new(2)
        );
        assert_eq!(
            average_order_value(&[Points::new(100), Points::new(101), Points::new(101)]),
            Points::new(101)
        );
    }

    #[test]
    fn test_top_products_sums_and_sorts() {
        let items = vec![
            sold(1, "Mug", 1),
            sold(2, "Hoodie", 3),
            sold(1, "Mug", 4),
            sold(3, "Cap", 2),
        ];
        let top = top_products(&items, 5);
        let names: Vec<_> = top.iter().map(|t| t.product_name.as_str()).collect();
        assert_eq!(names, vec!["Mug", "Hoodie", "Cap"]);
        assert_eq!(top[0].quantity, 5);
    }

    #[test]
    fn test_top_products_ties_keep_encounter_order_and_limit() {
        let items: Vec<_> = (1..=7).map(|n| sold(n, &format!("P{n}"), 2)).collect();
        let top = top_products(&items, 5);
        let names: Vec<_> = top.iter().map(|t| t.product_name.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2", "P3", "P4", "P5"]);
    }
}
