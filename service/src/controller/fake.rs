//! In-memory [`RecordStore`] double for the controller tests.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use common::{
    operations::{By, Insert, Select, Update},
    CurrencyCode, DateTime, Money,
};
use tokio::sync::oneshot;
use tracerr::Traced;

use crate::{
    domain::{
        account,
        opportunity::{
            self,
            line_item::{self, Quantity},
            Closing, LineItem, Name, Payload, Probability, Stage,
        },
        product, Opportunity, Product,
    },
    infra::{record_store, RecordStore},
    read::opportunity::list,
    Config, Service,
};

/// Result a gated request resolves with.
pub(crate) type Outcome = Result<(), record_store::Error>;

/// Write request observed by a [`Store`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Write {
    /// New opportunity creation.
    Insert,

    /// Full update of an opportunity.
    Update(opportunity::Id),

    /// Stage-only update of an opportunity.
    Stage(opportunity::Id, Stage),
}

/// [`RecordStore`] keeping its records in memory.
///
/// Write requests may be held until released through a [`Store::gate()`].
#[derive(Clone, Debug, Default)]
pub(crate) struct Store(Rc<RefCell<State>>);

#[derive(Debug, Default)]
struct State {
    records: Vec<Opportunity>,
    products: Vec<Product>,
    gates: VecDeque<oneshot::Receiver<Outcome>>,
    writes: Vec<Write>,
}

impl Store {
    pub(crate) fn with_records(
        self,
        records: impl IntoIterator<Item = Opportunity>,
    ) -> Self {
        self.0.borrow_mut().records.extend(records);
        self
    }

    pub(crate) fn with_products(
        self,
        products: impl IntoIterator<Item = Product>,
    ) -> Self {
        self.0.borrow_mut().products.extend(products);
        self
    }

    /// Holds the next write request until the returned sender resolves it.
    pub(crate) fn gate(&self) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.0.borrow_mut().gates.push_back(rx);
        tx
    }

    /// Returns the write requests observed so far.
    pub(crate) fn writes(&self) -> Vec<Write> {
        self.0.borrow().writes.clone()
    }

    /// Returns the stored record with the provided `id`.
    pub(crate) fn record(&self, id: opportunity::Id) -> Option<Opportunity> {
        self.0.borrow().records.iter().find(|o| o.id == id).cloned()
    }

    /// Removes the record with the provided `id`, as if deleted remotely.
    pub(crate) fn forget(&self, id: opportunity::Id) {
        self.0.borrow_mut().records.retain(|o| o.id != id);
    }

    /// Records the provided `write` and waits for its gate, if any.
    async fn pass(
        &self,
        write: Write,
    ) -> Result<(), Traced<record_store::Error>> {
        let gate = {
            let mut state = self.0.borrow_mut();
            state.writes.push(write);
            state.gates.pop_front()
        };
        match gate {
            Some(rx) => rx.await.unwrap_or(Ok(())).map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }

    /// Stores the provided `payload` under the provided `id`.
    fn store(&self, id: opportunity::Id, payload: Payload) -> Opportunity {
        let now = DateTime::now();
        let mut state = self.0.borrow_mut();
        let created_at = state
            .records
            .iter()
            .find(|o| o.id == id)
            .map_or(now.coerce(), |o| o.created_at);
        let opp = Opportunity {
            id,
            account_id: payload.account_id,
            contact_id: payload.contact_id,
            owner_id: payload.owner_id,
            name: payload.name,
            description: payload.description,
            amount: payload.amount,
            probability: payload.probability,
            expected_close_at: payload.expected_close_at,
            stage: payload.stage,
            closing: payload.closing,
            line_items: payload
                .line_items
                .into_iter()
                .map(|i| LineItem {
                    id: Some(i.id.unwrap_or_else(line_item::Id::new)),
                    product_id: Some(i.product_id),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    discount_amount: i.discount_amount,
                    discount_percent: i.discount_percent,
                    currency: Some(i.currency),
                })
                .collect(),
            created_at,
            updated_at: now.coerce(),
        };
        state.records.retain(|o| o.id != id);
        state.records.push(opp.clone());
        opp
    }
}

/// Returns an error the record store responds with for a missing record.
fn not_found() -> Traced<record_store::Error> {
    tracerr::new!(record_store::Error::Rejected {
        status: 404,
        body: "not found".into(),
    })
}

impl RecordStore<Select<By<Option<Opportunity>, opportunity::Id>>> for Store {
    type Ok = Option<Opportunity>;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Opportunity>, opportunity::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.record(by.into_inner()))
    }
}

impl RecordStore<Select<By<list::Collection, list::Selector>>> for Store {
    type Ok = list::Collection;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Collection, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector { filter, top } = by.into_inner();
        let mut items = self
            .0
            .borrow()
            .records
            .iter()
            .filter(|o| {
                filter.stages.is_empty() || filter.stages.contains(&o.stage)
            })
            .filter(|o| filter.account_id.map_or(true, |a| o.account_id == a))
            .cloned()
            .collect::<Vec<_>>();
        let total = u64::try_from(items.len()).unwrap();
        if let Some(top) = top {
            items.truncate(usize::try_from(top).unwrap());
        }
        Ok(list::Collection {
            items,
            total_count: total.into(),
        })
    }
}

impl RecordStore<Select<By<Option<Product>, product::Id>>> for Store {
    type Ok = Option<Product>;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.borrow().products.iter().find(|p| p.id == id).cloned())
    }
}

impl RecordStore<Insert<Payload>> for Store {
    type Ok = Opportunity;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Insert(payload): Insert<Payload>,
    ) -> Result<Self::Ok, Self::Err> {
        self.pass(Write::Insert).await?;
        Ok(self.store(opportunity::Id::new(), payload))
    }
}

impl RecordStore<Update<(opportunity::Id, Payload)>> for Store {
    type Ok = Opportunity;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Update((id, payload)): Update<(opportunity::Id, Payload)>,
    ) -> Result<Self::Ok, Self::Err> {
        self.pass(Write::Update(id)).await?;
        if self.record(id).is_none() {
            return Err(not_found());
        }
        Ok(self.store(id, payload))
    }
}

impl RecordStore<Update<(opportunity::Id, Stage)>> for Store {
    type Ok = ();
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Update((id, stage)): Update<(opportunity::Id, Stage)>,
    ) -> Result<Self::Ok, Self::Err> {
        self.pass(Write::Stage(id, stage)).await?;
        let mut state = self.0.borrow_mut();
        let rec = state
            .records
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(not_found)?;
        rec.stage = stage;
        Ok(())
    }
}

/// Creates a [`Service`] backed by the provided [`Store`].
pub(crate) fn service(store: &Store) -> Service<Store> {
    Service::new(
        Config {
            default_currency: CurrencyCode::new("USD").unwrap(),
            default_probability: Probability::DEFAULT,
        },
        store.clone(),
    )
}

/// Creates a [`Product`] with the provided list `price`.
pub(crate) fn product(price: &str, currency: &str) -> Product {
    Product {
        id: product::Id::new(),
        name: "Seat license".into(),
        price: Money {
            amount: price.parse().unwrap(),
            currency: CurrencyCode::new(currency).unwrap(),
        },
    }
}

/// Creates a stored [`Opportunity`] with a single USD line item worth the
/// provided `amount`.
pub(crate) fn opportunity(stage: Stage, amount: &str) -> Opportunity {
    let usd = CurrencyCode::new("USD").unwrap();
    let amount = amount.parse().unwrap();
    let now = DateTime::now();
    Opportunity {
        id: opportunity::Id::new(),
        account_id: account::Id::new(),
        contact_id: None,
        owner_id: None,
        name: Name::new("Fleet renewal").unwrap(),
        description: String::new(),
        amount: Money {
            amount,
            currency: usd.clone(),
        },
        probability: Probability::DEFAULT,
        expected_close_at: None,
        stage,
        closing: Closing::default(),
        line_items: vec![LineItem {
            id: Some(line_item::Id::new()),
            product_id: Some(product::Id::new()),
            quantity: Quantity::new(1),
            unit_price: amount,
            currency: Some(usd),
            ..LineItem::default()
        }],
        created_at: now.coerce(),
        updated_at: now.coerce(),
    }
}
