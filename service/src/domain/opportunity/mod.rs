//! [`Opportunity`] definitions.

pub mod draft;
pub mod line_item;
pub mod pricing;
pub mod stage;

use common::{unit, CurrencyCode, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{account, contact, employee};

pub use self::{
    draft::{Draft, Payload},
    line_item::LineItem,
    pricing::Totals,
    stage::{Closing, Stage},
};

/// Sales deal tracked through a pipeline of [`Stage`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Opportunity {
    /// ID of this [`Opportunity`].
    pub id: Id,

    /// ID of the account owning this [`Opportunity`].
    pub account_id: account::Id,

    /// ID of the contact person of this [`Opportunity`], if any.
    pub contact_id: Option<contact::Id>,

    /// ID of the employee owning this [`Opportunity`], if any.
    pub owner_id: Option<employee::Id>,

    /// [`Name`] of this [`Opportunity`].
    pub name: Name,

    /// Free-text description of this [`Opportunity`].
    pub description: String,

    /// Sum of the [`LineItem`] totals.
    ///
    /// Derived, never edited on its own.
    pub amount: Money,

    /// Chance of winning this [`Opportunity`].
    pub probability: Probability,

    /// Expected moment of closing this [`Opportunity`].
    pub expected_close_at: Option<ExpectedCloseDateTime>,

    /// Current [`Stage`] of this [`Opportunity`].
    pub stage: Stage,

    /// [`Closing`] metadata, present for closed [`Stage`]s only.
    pub closing: Closing,

    /// [`LineItem`]s of this [`Opportunity`].
    ///
    /// May be empty when the record is listed without its [`LineItem`]s.
    pub line_items: Vec<LineItem>,

    /// [`DateTime`] when this [`Opportunity`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Opportunity`] was modified the last time.
    ///
    /// [`DateTime`]: common::DateTime
    pub updated_at: ModificationDateTime,
}

impl Opportunity {
    /// Returns the currency of this [`Opportunity`].
    #[must_use]
    pub fn currency(&self) -> &CurrencyCode {
        &self.amount.currency
    }
}

/// ID of an [`Opportunity`].
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

/// Name of an [`Opportunity`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] out of the provided trimmed `name`, if it's not
    /// blank.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 512).then(|| Self(name.to_owned()))
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Chance of winning an [`Opportunity`], in integer percents.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
pub struct Probability(u8);

impl Probability {
    /// [`Probability`] of newly created [`Opportunity`]s.
    pub const DEFAULT: Self = Self(50);

    /// Creates a new [`Probability`] clamping the provided raw value into
    /// `0..=100` range.
    #[must_use]
    pub fn clamped(raw: i64) -> Self {
        Self(u8::try_from(raw.clamp(0, 100)).unwrap_or(100))
    }

    /// Returns the value in percents.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Probability {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`DateTime`] when an [`Opportunity`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Opportunity, unit::Creation)>;

/// [`DateTime`] when an [`Opportunity`] was modified the last time.
///
/// [`DateTime`]: common::DateTime
pub type ModificationDateTime = DateTimeOf<(Opportunity, unit::Modification)>;

/// [`DateTime`] when an [`Opportunity`] was closed.
///
/// [`DateTime`]: common::DateTime
pub type ClosingDateTime = DateTimeOf<(Opportunity, unit::Closing)>;

/// Marker type indicating an expected [`Opportunity`] closing.
#[derive(Clone, Copy, Debug)]
pub struct ExpectedClose;

/// [`DateTime`] when an [`Opportunity`] is expected to be closed.
///
/// [`DateTime`]: common::DateTime
pub type ExpectedCloseDateTime = DateTimeOf<(Opportunity, ExpectedClose)>;

/// Local validation failure of an [`Opportunity`] draft.
///
/// Never reaches the record store.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// No account is linked.
    #[display("account is required")]
    AccountRequired,

    /// [`LineItem`] or the whole [`Opportunity`] is worth more than
    /// [`pricing::MAX_AMOUNT`].
    #[display("amount exceeds the maximum of {}", pricing::MAX_AMOUNT)]
    AmountOverflow,

    /// Lost [`Opportunity`] has no close reason.
    #[display("close reason is required for a lost opportunity")]
    CloseReasonRequired,

    /// Closing metadata is present for an open [`Stage`].
    #[display("closing details are not allowed for an open opportunity")]
    ClosingForbidden,

    /// Currency of a [`LineItem`]'s product differs from the
    /// [`Opportunity`]'s one.
    #[display(
        "line item #{line} is priced in `{actual}`, \
         while the opportunity is in `{expected}`"
    )]
    CurrencyMismatch {
        /// Index of the mismatched [`LineItem`].
        line: usize,

        /// Currency of the [`Opportunity`].
        expected: CurrencyCode,

        /// Currency of the [`LineItem`]'s product.
        actual: CurrencyCode,
    },

    /// Provided code is not a known [`Stage`].
    #[display("invalid stage code: {_0}")]
    InvalidStage(#[error(not(source))] i64),

    /// There is no [`LineItem`] at the provided index.
    #[display("line item #{_0} does not exist")]
    LineItemOutOfRange(#[error(not(source))] usize),

    /// [`Name`] is blank.
    #[display("name is required")]
    NameRequired,

    /// No [`LineItem`] has a product selected.
    #[display("at least one priced line item is required")]
    NoPricedLineItems,
}

impl ValidationError {
    /// Returns the name of the form field this [`ValidationError`] relates
    /// to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::AccountRequired => "AccountID",
            Self::CloseReasonRequired => "CloseReason",
            Self::ClosingForbidden => "ClosedAt",
            Self::CurrencyMismatch { .. } => "CurrencyCode",
            Self::InvalidStage(_) => "Stage",
            Self::AmountOverflow
            | Self::LineItemOutOfRange(_)
            | Self::NoPricedLineItems => "LineItems",
            Self::NameRequired => "Name",
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Name, Probability, ValidationError};

    #[test]
    fn name_is_trimmed_and_non_blank() {
        assert_eq!(Name::new("  Big deal ").unwrap().to_string(), "Big deal");
        assert!(Name::new("   ").is_none());
        assert!(Name::new("x".repeat(513)).is_none());
    }

    #[test]
    fn probability_is_clamped() {
        assert_eq!(Probability::clamped(-10).get(), 0);
        assert_eq!(Probability::clamped(75).get(), 75);
        assert_eq!(Probability::clamped(1_000).get(), 100);
        assert_eq!(Probability::default().get(), 50);
    }

    #[test]
    fn validation_errors_name_their_field() {
        assert_eq!(ValidationError::NoPricedLineItems.field(), "LineItems");
        assert_eq!(ValidationError::CloseReasonRequired.field(), "CloseReason");
        assert_eq!(
            ValidationError::NoPricedLineItems.to_string(),
            "at least one priced line item is required",
        );
    }
}
