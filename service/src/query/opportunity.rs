//! [`Query`] collection related to a single [`Opportunity`].

use common::operations::By;

use crate::domain::{opportunity, Opportunity};
#[cfg(doc)]
use crate::Query;

use super::StoreQuery;

/// Queries an [`Opportunity`] along with its line items by its
/// [`opportunity::Id`].
pub type ById = StoreQuery<By<Option<Opportunity>, opportunity::Id>>;
