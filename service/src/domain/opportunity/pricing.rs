//! Pricing of [`LineItem`]s.
//!
//! Intermediate values are kept at full precision, only the outputs of
//! [`line_totals()`] are rounded, so rounding errors don't compound across a
//! list of [`LineItem`]s.
//!
//! Arithmetic saturates instead of overflowing. Amounts above [`MAX_AMOUNT`]
//! are only good for display, and are never saved.

use std::{iter::Sum, ops};

use common::money;
use rust_decimal::Decimal;

use super::LineItem;

/// Largest amount (10^18) a [`LineItem`] or a whole opportunity may be saved
/// with.
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(0xA764_0000, 0x0DE0_B6B3, 0, false, 0);

/// Monetary totals of one or many [`LineItem`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    /// Sum before any discount.
    pub subtotal: Decimal,

    /// Sum after all the discounts.
    pub total: Decimal,
}

impl Totals {
    /// Zero [`Totals`].
    pub const ZERO: Self = Self {
        subtotal: Decimal::ZERO,
        total: Decimal::ZERO,
    };

    /// Returns the overall discount of these [`Totals`].
    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.subtotal - self.total
    }

    /// Indicates whether these [`Totals`] do not exceed [`MAX_AMOUNT`].
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.subtotal <= MAX_AMOUNT
    }
}

impl ops::Add for Totals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            subtotal: self.subtotal.saturating_add(rhs.subtotal),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

/// Computes [`Totals`] of a single [`LineItem`].
///
/// Both the flat and the percentage discounts apply to the line subtotal, and
/// together never exceed it, so `0 <= total <= subtotal` always holds.
#[must_use]
pub fn line_totals(item: &LineItem) -> Totals {
    let quantity = Decimal::from(item.quantity.get().max(1));
    let subtotal = quantity.saturating_mul(item.unit_price);
    let percent_discount = item.discount_percent.of(subtotal);
    let discount = (item.discount_amount.saturating_add(percent_discount))
        .max(Decimal::ZERO)
        .min(subtotal);
    let total = (subtotal - discount).max(Decimal::ZERO);

    Totals {
        subtotal: money::round(subtotal),
        total: money::round(total),
    }
}

/// Aggregates [`Totals`] of all the provided [`LineItem`]s.
///
/// Returns [`Totals::ZERO`] for no [`LineItem`]s.
#[must_use]
pub fn aggregate<'i>(items: impl IntoIterator<Item = &'i LineItem>) -> Totals {
    items.into_iter().map(line_totals).sum()
}

#[cfg(test)]
mod spec {
    use common::{money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::opportunity::line_item::{LineItem, Quantity};

    use super::{aggregate, line_totals, Totals, MAX_AMOUNT};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(qty: i64, price: &str, amount: &str, percent: &str) -> LineItem {
        LineItem {
            quantity: Quantity::new(qty),
            unit_price: decimal(price),
            discount_amount: decimal(amount),
            discount_percent: Percent::clamped(decimal(percent)),
            ..LineItem::default()
        }
    }

    /// Deterministic assortment of line items with awkward fractions.
    fn assortment(seed: u32, len: u32) -> Vec<LineItem> {
        (0..len)
            .map(|i| {
                let n = seed.wrapping_mul(31).wrapping_add(i * 17) % 97;
                let price = Decimal::new(i64::from(n) * 1_337 + 5, 3);
                LineItem {
                    quantity: Quantity::new(i64::from(n % 7) - 1),
                    unit_price: price,
                    discount_amount: Decimal::new(i64::from(n % 13) * 25, 2),
                    discount_percent: Percent::clamped(Decimal::new(
                        i64::from(n % 40) * 5,
                        1,
                    )),
                    ..LineItem::default()
                }
            })
            .collect()
    }

    #[test]
    fn flat_and_percent_discounts_add_up() {
        let totals = line_totals(&item(2, "50.00", "5", "10"));

        assert_eq!(totals.subtotal, decimal("100.00"));
        assert_eq!(totals.discount(), decimal("15.00"));
        assert_eq!(totals.total, decimal("85.00"));
    }

    #[test]
    fn sums_line_totals() {
        let items = [item(2, "50.00", "5", "10"), item(1, "40", "0", "0")];

        assert_eq!(aggregate(&items).total, decimal("125.00"));
        assert_eq!(aggregate(&items).subtotal, decimal("140.00"));
    }

    #[test]
    fn empty_list_is_zero() {
        assert_eq!(aggregate(Vec::<LineItem>::new().iter()), Totals::ZERO);
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let totals = line_totals(&item(1, "10", "8", "50"));

        assert_eq!(totals.subtotal, decimal("10"));
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn non_positive_quantity_counts_as_one() {
        let zero = line_totals(&item(0, "12.5", "0", "0"));
        let negative = line_totals(&item(-4, "12.5", "0", "0"));

        assert_eq!(zero.subtotal, decimal("12.5"));
        assert_eq!(negative.total, decimal("12.5"));
    }

    #[test]
    fn rounds_only_at_output() {
        // 3 * 0.335 = 1.005, 1.005 * 10% = 0.1005 => 0.9045
        let totals = line_totals(&item(3, "0.335", "0", "10"));

        assert_eq!(totals.subtotal, decimal("1.01"));
        assert_eq!(totals.total, decimal("0.90"));
    }

    #[test]
    fn totals_are_bounded_by_subtotal() {
        for seed in 0..50 {
            for it in assortment(seed, 12) {
                let totals = line_totals(&it);
                let quantity = Decimal::from(it.quantity.get().max(1));

                assert!(totals.total >= Decimal::ZERO, "{it:?}");
                assert!(totals.total <= totals.subtotal, "{it:?}");
                assert_eq!(
                    totals.subtotal,
                    money::round(quantity * it.unit_price),
                    "{it:?}",
                );
            }
        }
    }

    #[test]
    fn aggregate_is_associative_over_concatenation() {
        for seed in 0..50 {
            let a = assortment(seed, 5);
            let b = assortment(seed + 1_000, 9);

            let whole = aggregate(a.iter().chain(&b));

            assert_eq!(
                whole.total,
                money::round(aggregate(&a).total + aggregate(&b).total),
            );
            assert_eq!(
                whole.subtotal,
                money::round(aggregate(&a).subtotal + aggregate(&b).subtotal),
            );
        }
    }

    #[test]
    fn max_amount_is_ten_to_eighteen() {
        assert_eq!(MAX_AMOUNT, Decimal::from(10_i64.pow(18)));
    }

    #[test]
    fn huge_line_saturates() {
        let huge = item(i64::MAX, "100000000000000000000", "0", "50");

        let totals = line_totals(&huge);

        assert_eq!(totals.subtotal, money::round(Decimal::MAX));
        assert!(totals.total <= totals.subtotal);
        assert!(totals.total > Decimal::ZERO);
        assert!(!totals.is_within_bounds());

        let sum = aggregate([&huge, &huge]);
        assert_eq!(sum.subtotal, totals.subtotal);
        assert!(!sum.is_within_bounds());
    }

    #[test]
    fn ordinary_totals_are_within_bounds() {
        assert!(line_totals(&item(3, "999.99", "0", "0")).is_within_bounds());
        assert!(Totals::ZERO.is_within_bounds());
    }
}
