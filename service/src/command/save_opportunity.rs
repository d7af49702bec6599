//! [`Command`] for saving an [`Opportunity`].

use common::operations::{Insert, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::opportunity::Draft;
use crate::{
    domain::{
        opportunity::{self, Payload},
        Opportunity,
    },
    infra::{record_store, RecordStore},
    Service,
};

use super::Command;

/// [`Command`] for saving an [`Opportunity`] built from a [`Draft`].
///
/// Creates a new [`Opportunity`] if the [`Payload`] has no ID, or fully
/// updates the existing one otherwise.
#[derive(Clone, Debug, From)]
pub struct SaveOpportunity {
    /// Validated [`Payload`] to be saved.
    pub payload: Payload,
}

impl<Store> Command<SaveOpportunity> for Service<Store>
where
    Store: RecordStore<
            Insert<Payload>,
            Ok = Opportunity,
            Err = Traced<record_store::Error>,
        > + RecordStore<
            Update<(opportunity::Id, Payload)>,
            Ok = Opportunity,
            Err = Traced<record_store::Error>,
        >,
{
    type Ok = Opportunity;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SaveOpportunity,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SaveOpportunity { payload } = cmd;

        let Some(id) = payload.id else {
            log::debug!("creating a new `Opportunity`");
            return self
                .record_store()
                .execute(Insert(payload))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E));
        };

        log::debug!("updating `Opportunity({id})`");
        self.record_store()
            .execute(Update((id, payload)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map_err(|e| {
                let stale = matches!(
                    e.as_ref(),
                    E::RecordStore(err) if err.is_stale_reference(),
                );
                if stale {
                    tracerr::new!(E::OpportunityNotExists(id))
                } else {
                    e
                }
            })
    }
}

/// Error of [`SaveOpportunity`] [`Command`] execution.
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
    /// Indicates whether the [`SaveOpportunity`] may succeed if simply
    /// retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OpportunityNotExists(_) => false,
            Self::RecordStore(e) => e.is_retryable(),
        }
    }
}
