//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::Decimal;

/// Decimal percentage within `0..=100` range.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "Decimal", into = "Decimal")
)]
pub struct Percent(Decimal);

impl Percent {
    /// Zero percents.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Hundred percents.
    pub const HUNDRED: Self = Self(Decimal::ONE_HUNDRED);

    /// Creates a new [`Percent`] by checking the provided value is within
    /// `0..=100` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Creates a new [`Percent`] clamping the provided value into `0..=100`
    /// range.
    #[must_use]
    pub fn clamped(val: Decimal) -> Self {
        Self(val.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    /// Returns the raw value of this [`Percent`].
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Returns this [`Percent`] share of the provided `amount`.
    ///
    /// No rounding is applied, unless the `amount` is too large to be
    /// multiplied exactly.
    #[must_use]
    pub fn of(self, amount: Decimal) -> Decimal {
        amount.checked_mul(self.0).map_or_else(
            || (amount / Decimal::ONE_HUNDRED).saturating_mul(self.0),
            |share| share / Decimal::ONE_HUNDRED,
        )
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = &'static str;

    fn try_from(val: Decimal) -> Result<Self, Self::Error> {
        Self::new(val).ok_or("percent out of `0..=100` range")
    }
}

impl From<Percent> for Decimal {
    fn from(p: Percent) -> Self {
        p.0
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::Percent;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn checks_range() {
        assert!(Percent::new(decimal("0")).is_some());
        assert!(Percent::new(decimal("100")).is_some());
        assert!(Percent::new(decimal("12.5")).is_some());

        assert!(Percent::new(decimal("-0.01")).is_none());
        assert!(Percent::new(decimal("100.01")).is_none());
        assert!("101".parse::<Percent>().is_err());
    }

    #[test]
    fn clamps() {
        assert_eq!(Percent::clamped(decimal("-5")), Percent::ZERO);
        assert_eq!(Percent::clamped(decimal("150")), Percent::HUNDRED);
        assert_eq!(Percent::clamped(decimal("10")).value(), decimal("10"));
    }

    #[test]
    fn takes_share() {
        let ten = Percent::clamped(decimal("10"));

        assert_eq!(ten.of(decimal("100")), decimal("10"));
        assert_eq!(ten.of(decimal("0.05")), decimal("0.005"));
        assert_eq!(Percent::ZERO.of(decimal("42")), Decimal::ZERO);
    }

    #[test]
    fn takes_share_of_huge_amount() {
        let half = Percent::clamped(decimal("50"));

        let share = half.of(Decimal::MAX);

        assert!(share > Decimal::ZERO);
        assert!(share < Decimal::MAX);
    }
}
