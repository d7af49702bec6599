//! [`Command`] for moving an [`Opportunity`] into another [`Stage`].

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::opportunity::{self, Stage},
    infra::{record_store, RecordStore},
    Service,
};
#[cfg(doc)]
use crate::domain::Opportunity;

use super::Command;

/// [`Command`] for moving an [`Opportunity`] into another [`Stage`].
///
/// Only the [`Stage`] is updated, any side effects (like closing metadata
/// defaults) are left for the record store to compute.
#[derive(Clone, Copy, Debug)]
pub struct MoveOpportunity {
    /// ID of the [`Opportunity`] to be moved.
    pub opportunity_id: opportunity::Id,

    /// [`Stage`] to move the [`Opportunity`] into.
    pub stage: Stage,
}

impl<Store> Command<MoveOpportunity> for Service<Store>
where
    Store: RecordStore<
        Update<(opportunity::Id, Stage)>,
        Ok = (),
        Err = Traced<record_store::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MoveOpportunity,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MoveOpportunity {
            opportunity_id,
            stage,
        } = cmd;

        self.record_store()
            .execute(Update((opportunity_id, stage)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map_err(|e| {
                let stale = matches!(
                    e.as_ref(),
                    E::RecordStore(err) if err.is_stale_reference(),
                );
                if stale {
                    tracerr::new!(E::OpportunityNotExists(opportunity_id))
                } else {
                    e
                }
            })
    }
}

/// Error of [`MoveOpportunity`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Opportunity`] with the provided ID does not exist.
    #[display("`Opportunity(id: {_0})` does not exist")]
    #[from(ignore)]
    OpportunityNotExists(#[error(not(source))] opportunity::Id),

    /// [`RecordStore`] error.
    #[display("`RecordStore` operation failed: {_0}")]
    RecordStore(record_store::Error),
}

impl ExecutionError {
    /// Indicates whether the [`MoveOpportunity`] may succeed if simply
    /// retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OpportunityNotExists(_) => false,
            Self::RecordStore(e) => e.is_retryable(),
        }
    }
}
