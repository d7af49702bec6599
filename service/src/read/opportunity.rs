//! [`Opportunity`]-related read definitions.

#[cfg(doc)]
use crate::domain::Opportunity;

pub mod list {
    //! [`Opportunity`] list definitions.

    use derive_more::{Display, From, Into};

    use crate::domain::{account, employee, opportunity::Stage, Opportunity};

    /// Selector of an [`Opportunity`] list.
    #[derive(Clone, Debug, Default)]
    pub struct Selector {
        /// [`Filter`] the listed [`Opportunity`]s must match.
        pub filter: Filter,

        /// Maximum number of the listed [`Opportunity`]s.
        ///
        /// [`None`] lists all the matching ones.
        pub top: Option<u32>,
    }

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// ID of the account the [`Opportunity`]s must belong to.
        pub account_id: Option<account::Id>,

        /// ID of the employee owning the [`Opportunity`]s.
        pub owner_id: Option<employee::Id>,

        /// [`Stage`]s the [`Opportunity`]s must be in.
        ///
        /// Empty means any [`Stage`].
        pub stages: Vec<Stage>,
    }

    /// Fetched [`Opportunity`] list ordered by [`Stage`] and then by the last
    /// modification, newest first.
    #[derive(Clone, Debug, Default)]
    pub struct Collection {
        /// Listed [`Opportunity`]s.
        pub items: Vec<Opportunity>,

        /// [`TotalCount`] of the matching [`Opportunity`]s, which may exceed
        /// the number of the listed ones.
        pub total_count: TotalCount,
    }

    /// Total count of [`Opportunity`] list items.
    #[derive(
        Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
    )]
    pub struct TotalCount(u64);
}
