//! [`Query`] collection related to the multiple [`Opportunity`].

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Opportunity, Query};

use super::StoreQuery;

/// Queries a list of [`Opportunity`].
pub type List = StoreQuery<
    By<read::opportunity::list::Collection, read::opportunity::list::Selector>,
>;
