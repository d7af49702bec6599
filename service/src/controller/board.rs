//! [`PipelineBoard`] controller.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use common::DateTime;
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{move_opportunity, MoveOpportunity},
    domain::{
        opportunity::{self, ModificationDateTime, Stage, ValidationError},
        Opportunity,
    },
    infra::{cache::Key, record_store, Cache},
    query, read, Command, Query, Service,
};

/// Kanban board of [`Opportunity`]s partitioned into [`Stage`] columns.
///
/// Moving an [`Opportunity`] between the columns is applied to the [`Cache`]
/// optimistically, and rolled back to its last confirmed state if the record
/// store rejects it.
#[derive(Debug)]
pub struct PipelineBoard<Store, C> {
    /// [`Service`] executing the requests.
    service: Service<Store>,

    /// [`Cache`] holding the [`Opportunity`] collection.
    cache: C,

    /// [`Stage`]s of the board columns, in display order.
    stages: RefCell<Vec<Stage>>,

    /// Moves in flight, keyed by the moved [`Opportunity`].
    moves: RefCell<HashMap<opportunity::Id, InFlight>>,

    /// Sequence number of the last started move.
    seq: Cell<u64>,
}

/// Moves of a single [`Opportunity`] being in flight.
#[derive(Debug)]
struct InFlight {
    /// Last state of the [`Opportunity`] confirmed by the record store.
    last_good: Opportunity,

    /// Sequence number of the first move tracked by this entry.
    since: u64,

    /// Sequence number of the latest started move.
    latest: u64,

    /// Sequence number of the latest confirmed move, if any.
    confirmed: u64,

    /// Number of moves still awaiting the record store.
    pending: usize,

    /// Indicator whether the latest started move failed.
    latest_failed: bool,
}

/// Column of a [`PipelineBoard`].
#[derive(Clone, Debug)]
pub struct Column {
    /// [`Stage`] of this [`Column`].
    pub stage: Stage,

    /// [`Opportunity`]s in this [`Column`], most recently modified first.
    pub opportunities: Vec<Opportunity>,

    /// Sum of the [`Opportunity`] amounts in this [`Column`].
    pub subtotal: Decimal,
}

/// Outcome of a successful [`PipelineBoard::move_item()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Moved {
    /// [`Opportunity`] is already in the target [`Stage`].
    Unchanged,

    /// Record store confirmed the move.
    Confirmed,
}

impl<Store, C: Cache> PipelineBoard<Store, C> {
    /// Creates a new empty [`PipelineBoard`] with a column for every
    /// [`Stage`].
    #[must_use]
    pub fn new(service: Service<Store>, cache: C) -> Self {
        Self {
            service,
            cache,
            stages: RefCell::new(Stage::ALL.to_vec()),
            moves: RefCell::default(),
            seq: Cell::new(0),
        }
    }

    /// Loads the provided `opportunities` into the [`Cache`] and lays them out
    /// in the columns of the provided `stages`.
    ///
    /// Results of the moves still in flight are not applied to the loaded
    /// `opportunities` anymore.
    pub fn load_columns(
        &self,
        stages: impl IntoIterator<Item = Stage>,
        opportunities: Vec<Opportunity>,
    ) {
        let mut columns = Vec::new();
        for stage in stages {
            if !columns.contains(&stage) {
                columns.push(stage);
            }
        }
        *self.stages.borrow_mut() = columns;
        self.moves.borrow_mut().clear();
        self.cache.store_opportunities(opportunities);
    }

    /// Fetches the [`Opportunity`] collection matching the provided
    /// `selector` and reloads the current columns with it.
    ///
    /// # Errors
    ///
    /// If the record store request failed. The board is left untouched then.
    pub async fn refresh(
        &self,
        selector: read::opportunity::list::Selector,
    ) -> Result<(), Traced<record_store::Error>>
    where
        Service<Store>: Query<
            query::opportunities::List,
            Ok = read::opportunity::list::Collection,
            Err = Traced<record_store::Error>,
        >,
    {
        let collection = self
            .service
            .execute(query::opportunities::List::by(selector))
            .await
            .map_err(tracerr::wrap!())?;

        let stages = self.stages.borrow().clone();
        self.load_columns(stages, collection.items);
        Ok(())
    }

    /// Returns the current [`Column`]s, computed from the [`Cache`].
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let items = self.cache.opportunities();
        self.stages
            .borrow()
            .iter()
            .map(|&stage| {
                let mut opportunities = items
                    .iter()
                    .filter(|o| o.stage == stage)
                    .cloned()
                    .collect::<Vec<_>>();
                opportunities.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                let subtotal = opportunities
                    .iter()
                    .map(|o| o.amount.amount)
                    .fold(Decimal::ZERO, Decimal::saturating_add);
                Column {
                    stage,
                    opportunities,
                    subtotal,
                }
            })
            .collect()
    }

    /// Indicates whether any move of the [`Opportunity`] with the provided
    /// `id` awaits the record store.
    #[must_use]
    pub fn is_moving(&self, id: opportunity::Id) -> bool {
        self.moves.borrow().contains_key(&id)
    }

    /// Moves the [`Opportunity`] with the provided `id` into the column of
    /// the stage with the provided raw `code`.
    ///
    /// The move is shown right away and then persisted. If persisting fails,
    /// the [`Opportunity`] returns to its last confirmed state, unless a
    /// later move of it has superseded this one.
    ///
    /// Moving an [`Opportunity`] into the stage it's already in does nothing,
    /// even if the board has no column for that stage.
    ///
    /// # Errors
    ///
    /// - [`MoveError::InvalidStage`] if the `code` is not a known stage.
    /// - [`MoveError::NotOnBoard`] if the board has no such column.
    /// - [`MoveError::NotLoaded`] if there is no such [`Opportunity`] on the
    ///   board, so it's due for a refresh.
    /// - [`MoveError::Execution`] if the record store rejected the move.
    pub async fn move_item(
        &self,
        id: opportunity::Id,
        code: i64,
    ) -> Result<Moved, Traced<MoveError>>
    where
        Service<Store>: Command<
            MoveOpportunity,
            Ok = (),
            Err = Traced<move_opportunity::ExecutionError>,
        >,
    {
        use MoveError as E;

        let stage =
            Stage::from_code(code).map_err(tracerr::from_and_wrap!(=> E))?;
        let Some(current) = self.cache.opportunity(id) else {
            return Err(tracerr::new!(E::NotLoaded(id)));
        };
        if current.stage == stage {
            return Ok(Moved::Unchanged);
        }
        if !self.stages.borrow().contains(&stage) {
            return Err(tracerr::new!(E::NotOnBoard(stage)));
        }

        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        {
            let mut moves = self.moves.borrow_mut();
            let entry = moves.entry(id).or_insert_with(|| InFlight {
                last_good: current.clone(),
                since: seq,
                latest: seq,
                confirmed: 0,
                pending: 0,
                latest_failed: false,
            });
            entry.latest = seq;
            entry.pending += 1;
            entry.latest_failed = false;
        }

        let updated_at: ModificationDateTime = DateTime::now().coerce();
        log::debug!(
            "moving `Opportunity({id})` from `{}` to `{stage}`",
            current.stage,
        );
        _ = self.cache.put_opportunity(Opportunity {
            stage,
            updated_at,
            ..current
        });

        let res = self
            .service
            .execute(MoveOpportunity {
                opportunity_id: id,
                stage,
            })
            .await;

        self.settle(id, seq, res.is_ok().then_some((stage, updated_at)));

        res.map(|()| Moved::Confirmed)
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }

    /// Reconciles the [`Cache`] once the move number `seq` of the
    /// [`Opportunity`] with the provided `id` completes.
    ///
    /// `confirmed` holds the [`Stage`] and modification time of a successful
    /// move, or [`None`] if it failed.
    fn settle(
        &self,
        id: opportunity::Id,
        seq: u64,
        confirmed: Option<(Stage, ModificationDateTime)>,
    ) {
        let mut moves = self.moves.borrow_mut();
        let Some(entry) = moves.get_mut(&id).filter(|e| seq >= e.since) else {
            // The board was reloaded meanwhile.
            return;
        };
        entry.pending -= 1;

        if let Some((stage, updated_at)) = confirmed {
            if seq > entry.confirmed {
                entry.confirmed = seq;
                entry.last_good.stage = stage;
                entry.last_good.updated_at = updated_at;
                if seq == entry.latest || entry.latest_failed {
                    _ = self.cache.put_opportunity(entry.last_good.clone());
                }
            }
            self.cache.invalidate(Key::OpportunityList);
        } else if seq == entry.latest {
            entry.latest_failed = true;
            log::warn!(
                "rolling `Opportunity({id})` back to `{}`",
                entry.last_good.stage,
            );
            _ = self.cache.put_opportunity(entry.last_good.clone());
        }

        if entry.pending == 0 {
            _ = moves.remove(&id);
        }
    }
}

/// Error of [`PipelineBoard::move_item()`].
#[derive(Debug, Display, Error, From)]
pub enum MoveError {
    /// [`MoveOpportunity`] [`Command`] failed.
    #[display("{_0}")]
    Execution(move_opportunity::ExecutionError),

    /// Target is not a known [`Stage`].
    #[display("{_0}")]
    InvalidStage(ValidationError),

    /// [`Opportunity`] is not on the board.
    #[display("`Opportunity(id: {_0})` is not loaded on the board")]
    #[from(ignore)]
    NotLoaded(#[error(not(source))] opportunity::Id),

    /// Board has no column of the target [`Stage`].
    #[display("board has no `{_0}` column")]
    #[from(ignore)]
    NotOnBoard(#[error(not(source))] Stage),
}

impl MoveError {
    /// Indicates whether the move may succeed if simply retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Execution(e) => e.is_retryable(),
            Self::InvalidStage(_)
            | Self::NotLoaded(_)
            | Self::NotOnBoard(_) => false,
        }
    }
}
