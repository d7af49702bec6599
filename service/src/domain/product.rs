//! [`Product`] definitions.

use common::Money;
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product which can be priced on an opportunity line.
///
/// Products come from a read-only lookup list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Product {
    /// ID of this [`Product`].
    pub id: Id,

    /// Human-readable name of this [`Product`].
    pub name: String,

    /// List price of this [`Product`], carrying its currency.
    pub price: Money,
}

/// ID of a [`Product`].
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
