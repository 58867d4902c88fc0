//! Order total calculation.
//!
//! Tax is a flat 10% of the subtotal and shipping is a flat $10.00 per order.
//! Totals are computed once when the order is placed and frozen into the row.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat tax rate applied to the order subtotal (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Flat shipping charge per order ($10.00).
pub const SHIPPING_COST: Decimal = Decimal::from_parts(1000, 0, 0, false, 2);

/// `price × quantity` for a single line.
#[must_use]
pub fn line_subtotal(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from `(unit price, quantity)` lines.
    ///
    /// Tax is rounded to cents with half-cent ties away from zero, the same
    /// rule `PostgreSQL` applies when storing into `NUMERIC(10,2)`.
    #[must_use]
    pub fn compute<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, i32)>,
    {
        let subtotal: Decimal = lines
            .into_iter()
            .map(|(price, quantity)| line_subtotal(price, quantity))
            .sum();
        let tax = (subtotal * TAX_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let shipping_cost = SHIPPING_COST;

        Self {
            subtotal,
            tax,
            shipping_cost,
            total: subtotal + tax + shipping_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_ten_dollar_item_times_two() {
        let totals = OrderTotals::compute([(dollars(1000), 2)]);

        assert_eq!(totals.subtotal, dollars(2000));
        assert_eq!(totals.tax, dollars(200));
        assert_eq!(totals.shipping_cost, dollars(1000));
        assert_eq!(totals.total, dollars(3200));
    }

    #[test]
    fn test_multiple_lines() {
        let totals = OrderTotals::compute([(dollars(1999), 1), (dollars(550), 3)]);

        // 19.99 + 16.50 = 36.49, tax 3.649 -> 3.65
        assert_eq!(totals.subtotal, dollars(3649));
        assert_eq!(totals.tax, dollars(365));
        assert_eq!(totals.total, dollars(3649 + 365 + 1000));
    }

    #[test]
    fn test_half_cent_tax_rounds_up() {
        // 0.25 * 10% = 0.025
        let totals = OrderTotals::compute([(dollars(25), 1)]);

        assert_eq!(totals.tax, dollars(3));
        assert_eq!(totals.total, dollars(25 + 3 + 1000));

        // 0.45 * 10% = 0.045
        let totals = OrderTotals::compute([(dollars(45), 1)]);
        assert_eq!(totals.tax, dollars(5));
    }

    #[test]
    fn test_empty_order_still_charges_shipping() {
        let totals = OrderTotals::compute(std::iter::empty());

        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, SHIPPING_COST);
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line_subtotal(dollars(1250), 4), dollars(5000));
    }
}
