//! [`Opportunity`]-related [`RecordStore`] implementations.

use common::operations::{By, Insert, Select, Update};
use itertools::Itertools as _;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        opportunity::{self, Payload, Stage},
        Opportunity,
    },
    infra::{
        record_store::{self, rest::wire},
        RecordStore, Rest,
    },
    read::opportunity::list,
};

/// Expansion of a single [`Opportunity`] record.
const EXPAND_ONE: &str =
    "LineItems($expand=Product),StageHistory,Tasks,Activities";

/// Expansion of a freshly written [`Opportunity`] record.
const EXPAND_WRITTEN: &str = "LineItems($expand=Product)";

/// Expansion of [`Opportunity`] list records.
const EXPAND_LIST: &str = "Account,Contact,Owner,LineItems($expand=Product)";

/// Ordering of [`Opportunity`] list records.
const ORDER_BY: &str = "Stage,UpdatedAt desc";

/// `Prefer` header value asking the record store to respond with the written
/// record.
const RETURN_REPRESENTATION: &str = "return=representation";

impl RecordStore<Select<By<Option<Opportunity>, opportunity::Id>>> for Rest {
    type Ok = Option<Opportunity>;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Opportunity>, opportunity::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let request = self
            .client
            .get(self.url(format!("Opportunities({id})")))
            .query(&[("$expand", EXPAND_ONE)]);

        match Self::fetch::<wire::OpportunityRecord>(request).await {
            Ok(rec) => {
                Opportunity::try_from(rec).map(Some).map_err(tracerr::wrap!())
            }
            Err(e) if e.as_ref().is_stale_reference() => Ok(None),
            Err(e) => Err(e).map_err(tracerr::wrap!()),
        }
    }
}

impl RecordStore<Select<By<list::Collection, list::Selector>>> for Rest {
    type Ok = list::Collection;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Collection, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector { filter, top } = by.into_inner();

        let mut query = vec![
            ("$expand", EXPAND_LIST.to_owned()),
            ("$orderby", ORDER_BY.to_owned()),
            ("$count", "true".to_owned()),
        ];
        if let Some(expr) = filter_expr(&filter) {
            query.push(("$filter", expr));
        }
        if let Some(top) = top {
            query.push(("$top", top.to_string()));
        }

        let page = Self::fetch::<wire::Collection<wire::OpportunityRecord>>(
            self.client.get(self.url("Opportunities")).query(&query),
        )
        .await
        .map_err(tracerr::wrap!())?;

        let listed = u64::try_from(page.value.len()).unwrap_or(u64::MAX);
        let items = page
            .value
            .into_iter()
            .map(Opportunity::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(tracerr::wrap!())?;

        Ok(list::Collection {
            items,
            total_count: page.count.unwrap_or(listed).into(),
        })
    }
}

impl RecordStore<Insert<Payload>> for Rest {
    type Ok = Opportunity;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Insert(payload): Insert<Payload>,
    ) -> Result<Self::Ok, Self::Err> {
        let request = self
            .client
            .post(self.url("Opportunities"))
            .query(&[("$expand", EXPAND_WRITTEN)])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&wire::OpportunityBody::from(&payload));

        let rec = Self::fetch::<wire::OpportunityRecord>(request)
            .await
            .map_err(tracerr::wrap!())?;
        Opportunity::try_from(rec).map_err(tracerr::wrap!())
    }
}

impl RecordStore<Update<(opportunity::Id, Payload)>> for Rest {
    type Ok = Opportunity;
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Update((id, payload)): Update<(opportunity::Id, Payload)>,
    ) -> Result<Self::Ok, Self::Err> {
        let request = self
            .client
            .patch(self.url(format!("Opportunities({id})")))
            .query(&[("$expand", EXPAND_WRITTEN)])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&wire::OpportunityBody::from(&payload));

        let rec = Self::fetch::<wire::OpportunityRecord>(request)
            .await
            .map_err(tracerr::wrap!())?;
        Opportunity::try_from(rec).map_err(tracerr::wrap!())
    }
}

impl RecordStore<Update<(opportunity::Id, Stage)>> for Rest {
    type Ok = ();
    type Err = Traced<record_store::Error>;

    async fn execute(
        &self,
        Update((id, stage)): Update<(opportunity::Id, Stage)>,
    ) -> Result<Self::Ok, Self::Err> {
        log::debug!("patching `Opportunity({id})` stage to `{stage}`");

        let request = self
            .client
            .patch(self.url(format!("Opportunities({id})")))
            .json(&wire::StagePatch { stage: stage.u8() });

        Self::send(request).await.map(drop).map_err(tracerr::wrap!())
    }
}

/// Builds an OData `$filter` expression out of the provided [`list::Filter`].
///
/// Returns [`None`] if the [`list::Filter`] matches everything.
fn filter_expr(filter: &list::Filter) -> Option<String> {
    let list::Filter {
        account_id,
        owner_id,
        stages,
    } = filter;

    let expr = [
        account_id.map(|id| format!("AccountID eq {id}")),
        owner_id.map(|id| format!("OwnerEmployeeID eq {id}")),
        (!stages.is_empty()).then(|| {
            let codes = stages.iter().copied().map(Stage::u8).join(",");
            format!("Stage in ({codes})")
        }),
    ]
    .into_iter()
    .flatten()
    .join(" and ");

    (!expr.is_empty()).then_some(expr)
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{account, opportunity::Stage},
        read::opportunity::list::Filter,
    };

    use super::filter_expr;

    #[test]
    fn empty_filter_matches_everything() {
        assert_eq!(filter_expr(&Filter::default()), None);
    }

    #[test]
    fn joins_filter_clauses() {
        let account_id = account::Id::new();

        let expr = filter_expr(&Filter {
            account_id: Some(account_id),
            owner_id: None,
            stages: vec![Stage::Qualification, Stage::Proposal],
        });

        assert_eq!(
            expr.unwrap(),
            format!("AccountID eq {account_id} and Stage in (2,4)"),
        );
    }
}
