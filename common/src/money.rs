//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places monetary values are rounded to.
pub const SCALE: u32 = 2;

/// Rounds the provided `amount` to [`SCALE`] decimal places, with midpoints
/// rounded away from zero (half-up for non-negative amounts).
#[must_use]
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Amount of money in some [`CurrencyCode`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`CurrencyCode`] of this amount.
    pub currency: CurrencyCode,
}

impl Money {
    /// Returns this [`Money`] with its amount [`round`]ed.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            amount: round(self.amount),
            ..self
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{:.2} {currency}", round(*amount))
    }
}

/// Opaque code of a currency (`USD`, `EUR`, ...).
///
/// No exchange rates are known: two [`CurrencyCode`]s are only ever compared
/// for equality.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "String", into = "String")
)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Creates a new [`CurrencyCode`] if the given `code` is valid.
    ///
    /// The code is trimmed and upper-cased, so `" usd"` and `"USD"` are the
    /// same currency.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim();
        (!code.is_empty()
            && code.len() <= 8
            && code.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| Self(code.to_ascii_uppercase()))
    }

    /// Returns this [`CurrencyCode`] as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(InvalidCurrencyCode)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Error of parsing an invalid [`CurrencyCode`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid currency code")]
pub struct InvalidCurrencyCode;

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::{round, CurrencyCode, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round(decimal("0.125")), decimal("0.13"));
        assert_eq!(round(decimal("0.124")), decimal("0.12"));
        assert_eq!(round(decimal("2.675")), decimal("2.68"));
        assert_eq!(round(decimal("10")), decimal("10"));
    }

    #[test]
    fn currency_code_is_normalized() {
        assert_eq!(CurrencyCode::new(" usd ").unwrap(), usd());
        assert_eq!(CurrencyCode::new("eur").unwrap().as_str(), "EUR");

        assert!(CurrencyCode::new("").is_none());
        assert!(CurrencyCode::new("   ").is_none());
        assert!(CurrencyCode::new("US D").is_none());
        assert!(CurrencyCode::new("VERYLONGCODE").is_none());
    }

    #[test]
    fn rounded() {
        let money = Money {
            amount: decimal("19.995"),
            currency: usd(),
        };

        assert_eq!(money.rounded().amount, decimal("20.00"));
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.456"),
                currency: usd(),
            }
            .to_string(),
            "123.46 USD",
        );
        assert_eq!(
            Money {
                amount: Decimal::ZERO,
                currency: usd(),
            }
            .to_string(),
            "0.00 USD",
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_currency_code() {
        let code: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(code.as_str(), "GBP");

        assert!(serde_json::from_str::<CurrencyCode>("\"\"").is_err());
    }
}
