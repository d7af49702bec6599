//! [`Query`] collection related to a single [`Product`].

use common::operations::By;

use crate::domain::{product, Product};
#[cfg(doc)]
use crate::Query;

use super::StoreQuery;

/// Queries a [`Product`] by its [`product::Id`].
pub type ById = StoreQuery<By<Option<Product>, product::Id>>;
