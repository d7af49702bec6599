//! [`Query`] definition.

pub mod opportunities;
pub mod opportunity;
pub mod product;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{record_store, RecordStore},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`RecordStore`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct StoreQuery<T>(T);

impl<W, B> StoreQuery<By<W, B>> {
    /// Creates a new [`StoreQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Store, W, B> Query<StoreQuery<By<W, B>>> for Service<Store>
where
    Store:
        RecordStore<Select<By<W, B>>, Ok = W, Err = Traced<record_store::Error>>,
{
    type Ok = W;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        StoreQuery(by): StoreQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.record_store()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}
