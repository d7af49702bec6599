//! [`Product`]-related [`RecordStore`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{product, Product},
    infra::{
        record_store::{self, rest::wire},
        RecordStore, Rest,
    },
};

impl RecordStore<Select<By<Option<Product>, product::Id>>> for Rest {
    type Ok = Option<Product>;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let request = self.client.get(self.url(format!("Products({id})")));

        match Self::fetch::<wire::ProductRecord>(request).await {
            Ok(rec) => {
                Product::try_from(rec).map(Some).map_err(tracerr::wrap!())
            }
            Err(e) if e.as_ref().is_stale_reference() => Ok(None),
            Err(e) => Err(e).map_err(tracerr::wrap!()),
        }
    }
}
