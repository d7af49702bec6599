//! [`Command`] definition.

pub mod move_opportunity;
pub mod save_opportunity;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    move_opportunity::MoveOpportunity, save_opportunity::SaveOpportunity,
};
