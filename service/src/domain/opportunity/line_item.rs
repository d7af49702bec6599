//! [`LineItem`] definitions.

use common::{CurrencyCode, Percent};
use derive_more::{Display, From, FromStr, Into};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, Product};
#[cfg(doc)]
use crate::domain::Opportunity;

use super::pricing::{self, Totals};

/// One priced [`Product`] entry within an [`Opportunity`].
///
/// While being drafted, a [`LineItem`] may have no [`Product`] selected yet.
/// Such lines are never saved.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineItem {
    /// ID of this [`LineItem`].
    ///
    /// [`None`] until the [`LineItem`] is saved for the first time.
    pub id: Option<Id>,

    /// ID of the priced [`Product`].
    pub product_id: Option<product::Id>,

    /// [`Quantity`] of the [`Product`] units.
    pub quantity: Quantity,

    /// Price of a single [`Product`] unit. Never negative.
    pub unit_price: Decimal,

    /// Flat discount applied to the whole line. Never negative.
    pub discount_amount: Decimal,

    /// Percentage discount applied to the whole line.
    pub discount_percent: Percent,

    /// Currency of the selected [`Product`].
    pub currency: Option<CurrencyCode>,
}

impl LineItem {
    /// Indicates whether a [`Product`] is selected on this [`LineItem`], so
    /// it may be saved.
    #[must_use]
    pub fn is_priced(&self) -> bool {
        self.product_id.is_some()
    }

    /// Computes [`Totals`] of this [`LineItem`].
    #[must_use]
    pub fn totals(&self) -> Totals {
        pricing::line_totals(self)
    }

    /// Applies the provided [`Patch`] to this [`LineItem`], sanitizing the
    /// incoming values.
    ///
    /// Selecting a [`Product`] takes over its currency and, unless the same
    /// [`Patch`] provides a unit price, its list price.
    pub fn apply(&mut self, patch: Patch) {
        let Patch {
            product,
            quantity,
            unit_price,
            discount_amount,
            discount_percent,
        } = patch;

        if let Some(product) = product {
            self.product_id = Some(product.id);
            self.currency = Some(product.price.currency);
            self.unit_price = non_negative(product.price.amount);
        }
        if let Some(qty) = quantity {
            self.quantity = Quantity::new(qty);
        }
        if let Some(price) = unit_price {
            self.unit_price = non_negative(price);
        }
        if let Some(amount) = discount_amount {
            self.discount_amount = non_negative(amount);
        }
        if let Some(percent) = discount_percent {
            self.discount_percent = Percent::clamped(percent);
        }
    }
}

/// Clamps the provided `amount` to be non-negative.
fn non_negative(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

/// Edit of a single [`LineItem`] in a draft.
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    /// Newly selected [`Product`].
    pub product: Option<Product>,

    /// New quantity. Values below `1` are treated as `1`.
    pub quantity: Option<i64>,

    /// New unit price. Negative values are treated as `0`.
    pub unit_price: Option<Decimal>,

    /// New flat discount. Negative values are treated as `0`.
    pub discount_amount: Option<Decimal>,

    /// New percentage discount. Clamped into `0..=100`.
    pub discount_percent: Option<Decimal>,
}

/// ID of a [`LineItem`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Number of [`Product`] units in a [`LineItem`]. Always at least `1`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Quantity(u32);

impl Quantity {
    /// Creates a new [`Quantity`] out of the provided raw value.
    ///
    /// Zero or negative values become `1` rather than zero revenue.
    #[must_use]
    pub fn new(raw: i64) -> Self {
        Self(u32::try_from(raw.max(1)).unwrap_or(u32::MAX))
    }

    /// Returns the number of units.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(1)
    }
}
