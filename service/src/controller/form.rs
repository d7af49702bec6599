//! [`OpportunityForm`] controller.

use std::cell::RefCell;

use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::opportunity::LineItem;
use crate::{
    command::{save_opportunity, SaveOpportunity},
    domain::{
        opportunity::{
            self, line_item::Patch, Draft, Payload, Totals, ValidationError,
        },
        product, Opportunity, Product,
    },
    infra::{cache::Key, record_store, Cache},
    query, Command, Query, Service,
};

/// Controller of a single [`Opportunity`] edit form.
///
/// Every (re-)initialization starts a new form session. Results of the
/// requests started in a previous session are never applied to the current
/// [`Draft`] or to the [`Cache`].
#[derive(Debug)]
pub struct OpportunityForm<Store, C> {
    /// [`Service`] executing the requests.
    service: Service<Store>,

    /// [`Cache`] shared with the sibling screens.
    cache: C,

    /// Mutable state of this form.
    state: RefCell<State>,
}

/// Mutable state of an [`OpportunityForm`].
#[derive(Debug)]
struct State {
    /// Number of the current form session.
    session: u64,

    /// Number of edits made to the [`Draft`] within the current session.
    revision: u64,

    /// Indicator whether the form was closed.
    closed: bool,

    /// [`Draft`] being edited.
    draft: Draft,
}

impl<Store, C: Cache> OpportunityForm<Store, C> {
    /// Creates a new [`OpportunityForm`] of a new [`Opportunity`].
    #[must_use]
    pub fn new(service: Service<Store>, cache: C) -> Self {
        let draft = Draft::new(&service.config().draft_defaults());
        Self {
            service,
            cache,
            state: RefCell::new(State {
                session: 0,
                revision: 0,
                closed: false,
                draft,
            }),
        }
    }

    /// Resets this form to edit the provided `existing` [`Opportunity`], or a
    /// new one if [`None`], starting a new form session.
    pub fn initialize(&self, existing: Option<&Opportunity>) {
        let draft = existing.map_or_else(
            || Draft::new(&self.service.config().draft_defaults()),
            Draft::from,
        );

        let mut state = self.state.borrow_mut();
        state.session += 1;
        state.revision = 0;
        state.closed = false;
        state.draft = draft;
    }

    /// Closes this form. Requests still in flight are ignored once they
    /// complete.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        state.session += 1;
        state.closed = true;
    }

    /// Indicates whether this form was closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Returns a snapshot of the current [`Draft`].
    #[must_use]
    pub fn draft(&self) -> Draft {
        self.state.borrow().draft.clone()
    }

    /// Edits the current [`Draft`] with the provided function.
    ///
    /// Meant for the plain fields (name, description, references,
    /// probability, dates), which need no recalculation.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Draft) -> R) -> R {
        let mut state = self.state.borrow_mut();
        state.revision += 1;
        f(&mut state.draft)
    }

    /// Returns the live [`Totals`] of the current [`Draft`].
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.state.borrow().draft.totals()
    }

    /// Applies the provided [`Patch`] to the [`LineItem`] at the provided
    /// `index`.
    ///
    /// # Errors
    ///
    /// See [`Draft::set_line_item()`].
    pub fn set_line_item(
        &self,
        index: usize,
        patch: Patch,
    ) -> Result<Totals, ValidationError> {
        self.edit(|d| d.set_line_item(index, patch))
    }

    /// Appends a new empty [`LineItem`] and returns its index.
    pub fn add_line_item(&self) -> usize {
        self.edit(Draft::add_line_item)
    }

    /// Removes the [`LineItem`] at the provided `index`.
    ///
    /// # Errors
    ///
    /// See [`Draft::remove_line_item()`].
    pub fn remove_line_item(
        &self,
        index: usize,
    ) -> Result<Totals, ValidationError> {
        self.edit(|d| d.remove_line_item(index))
    }

    /// Moves the [`Draft`] into the stage with the provided raw `code`.
    ///
    /// # Errors
    ///
    /// See [`Draft::set_stage()`].
    pub fn set_stage(&self, code: i64) -> Result<(), ValidationError> {
        self.edit(|d| d.set_stage(code))
    }

    /// Builds a validated [`Payload`] out of the current [`Draft`].
    ///
    /// # Errors
    ///
    /// See [`Draft::build_save_payload()`].
    pub fn build_save_payload(&self) -> Result<Payload, ValidationError> {
        self.state.borrow().draft.build_save_payload()
    }

    /// Loads the [`Opportunity`] with the provided `id` from the record store
    /// and starts editing it.
    ///
    /// # Errors
    ///
    /// - [`LoadError::OpportunityNotExists`] if there is no such
    ///   [`Opportunity`].
    /// - [`LoadError::Detached`] if this form was re-initialized or closed
    ///   while loading.
    /// - [`LoadError::RecordStore`] if the record store request failed.
    pub async fn load(
        &self,
        id: opportunity::Id,
    ) -> Result<(), Traced<LoadError>>
    where
        Service<Store>: Query<
            query::opportunity::ById,
            Ok = Option<Opportunity>,
            Err = Traced<record_store::Error>,
        >,
    {
        use LoadError as E;

        let session = self.state.borrow().session;

        let opp = self
            .service
            .execute(query::opportunity::ById::by(id))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OpportunityNotExists(id))
            .map_err(tracerr::wrap!())?;

        if !self.is_current(session) {
            log::warn!(
                "discarding `Opportunity({id})` loaded into a detached form",
            );
            return Err(tracerr::new!(E::Detached));
        }
        self.initialize(Some(&opp));
        Ok(())
    }

    /// Looks up the [`Product`] with the provided `product_id` and selects it
    /// on the [`LineItem`] at the provided `index`.
    ///
    /// # Errors
    ///
    /// - [`SelectProductError::ProductNotExists`] if there is no such
    ///   [`Product`].
    /// - [`SelectProductError::Validation`] if the [`Product`] cannot be
    ///   selected (the selection is kept if it's priced in another currency).
    /// - [`SelectProductError::Detached`] if this form was re-initialized or
    ///   closed during the lookup.
    /// - [`SelectProductError::RecordStore`] if the record store request
    ///   failed.
    pub async fn select_product(
        &self,
        index: usize,
        product_id: product::Id,
    ) -> Result<Totals, Traced<SelectProductError>>
    where
        Service<Store>: Query<
            query::product::ById,
            Ok = Option<Product>,
            Err = Traced<record_store::Error>,
        >,
    {
        use SelectProductError as E;

        let session = self.state.borrow().session;

        let product = self
            .service
            .execute(query::product::ById::by(product_id))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProductNotExists(product_id))
            .map_err(tracerr::wrap!())?;

        if !self.is_current(session) {
            return Err(tracerr::new!(E::Detached));
        }
        self.set_line_item(
            index,
            Patch {
                product: Some(product),
                ..Patch::default()
            },
        )
        .map_err(tracerr::from_and_wrap!(=> E))
    }

    /// Saves the current [`Draft`] into the record store.
    ///
    /// On success, the [`Cache`] entries of the [`Opportunity`] list, the
    /// [`Opportunity`] itself and its account are marked stale, and the
    /// [`Draft`] is re-seeded from the saved [`Opportunity`]. If the
    /// [`Draft`] was edited while saving, those edits are kept instead, and
    /// only the newly assigned IDs are taken over.
    ///
    /// # Errors
    ///
    /// - [`SaveError::Validation`] if the [`Draft`] cannot be saved. Nothing
    ///   is sent to the record store then.
    /// - [`SaveError::Execution`] if saving failed. The [`Draft`] is left
    ///   unchanged, so saving may be retried.
    /// - [`SaveError::Detached`] if this form was re-initialized or closed
    ///   while saving. Neither the [`Draft`] nor the [`Cache`] is touched.
    pub async fn save(&self) -> Result<Opportunity, Traced<SaveError>>
    where
        Service<Store>: Command<
            SaveOpportunity,
            Ok = Opportunity,
            Err = Traced<save_opportunity::ExecutionError>,
        >,
    {
        use SaveError as E;

        let (session, revision, payload) = {
            let state = self.state.borrow();
            if state.closed {
                return Err(tracerr::new!(E::Detached));
            }
            let payload = state
                .draft
                .build_save_payload()
                .map_err(tracerr::from_and_wrap!(=> E))?;
            (state.session, state.revision, payload)
        };

        let saved = self.service.execute(SaveOpportunity { payload }).await;

        if !self.is_current(session) {
            log::warn!("discarding result of saving a detached form");
            return Err(tracerr::new!(E::Detached));
        }
        let saved = saved.map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.cache.invalidate(Key::OpportunityList);
        self.cache.invalidate(Key::Opportunity(saved.id));
        self.cache.invalidate(Key::Account(saved.account_id));

        {
            let mut state = self.state.borrow_mut();
            if state.revision == revision {
                state.draft = Draft::from(&saved);
            } else {
                log::debug!(
                    "keeping edits made while saving `Opportunity({})`",
                    saved.id,
                );
                state.draft.adopt_saved_ids(&saved);
            }
        }
        Ok(saved)
    }

    /// Indicates whether the provided form `session` is still the active one.
    fn is_current(&self, session: u64) -> bool {
        let state = self.state.borrow();
        !state.closed && state.session == session
    }
}

/// Error of [`OpportunityForm::load()`].
#[derive(Debug, Display, Error, From)]
pub enum LoadError {
    /// Form was re-initialized or closed while loading.
    #[display("form was detached while loading")]
    Detached,

    /// [`Opportunity`] with the provided ID does not exist.
    #[display("`Opportunity(id: {_0})` does not exist")]
    #[from(ignore)]
    OpportunityNotExists(#[error(not(source))] opportunity::Id),

    /// Record store request failed.
    #[display("`RecordStore` operation failed: {_0}")]
    RecordStore(record_store::Error),
}

/// Error of [`OpportunityForm::select_product()`].
#[derive(Debug, Display, Error, From)]
pub enum SelectProductError {
    /// Form was re-initialized or closed during the lookup.
    #[display("form was detached while looking up a product")]
    Detached,

    /// [`Product`] with the provided ID does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    #[from(ignore)]
    ProductNotExists(#[error(not(source))] product::Id),

    /// Record store request failed.
    #[display("`RecordStore` operation failed: {_0}")]
    RecordStore(record_store::Error),

    /// [`Product`] cannot be selected.
    #[display("{_0}")]
    Validation(ValidationError),
}

/// Error of [`OpportunityForm::save()`].
#[derive(Debug, Display, Error, From)]
pub enum SaveError {
    /// Form was re-initialized or closed while saving.
    #[display("form was detached while saving")]
    Detached,

    /// [`SaveOpportunity`] [`Command`] failed.
    #[display("{_0}")]
    Execution(save_opportunity::ExecutionError),

    /// [`Draft`] cannot be saved.
    #[display("{_0}")]
    Validation(ValidationError),
}

impl SaveError {
    /// Indicates whether saving may succeed if simply retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Execution(e) => e.is_retryable(),
            Self::Detached | Self::Validation(_) => false,
        }
    }
}
