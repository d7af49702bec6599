//! Wire representation of the record store entities.
//!
//! Field names are PascalCase, timestamps are RFC 3339 strings, and decimals
//! are accepted both as JSON strings and numbers.

use common::{datetime::serde::rfc3339, CurrencyCode, Money, Percent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        account, contact, employee,
        opportunity::{
            self,
            draft::{Payload, PricedLineItem},
            line_item::{self, Quantity},
            Closing, ClosingDateTime, CreationDateTime, ExpectedCloseDateTime,
            LineItem, ModificationDateTime, Name, Probability, Stage,
        },
        product, Opportunity, Product,
    },
    infra::record_store,
};

/// Collection response envelope.
#[derive(Debug, Deserialize)]
pub(super) struct Collection<T> {
    /// Items of the collection page.
    pub(super) value: Vec<T>,

    /// Total count of the matching items, if requested.
    #[serde(rename = "@odata.count", default)]
    pub(super) count: Option<u64>,
}

/// Opportunity as returned by the record store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct OpportunityRecord {
    #[serde(rename = "ID")]
    id: opportunity::Id,
    #[serde(rename = "AccountID")]
    account_id: account::Id,
    #[serde(rename = "ContactID", default)]
    contact_id: Option<contact::Id>,
    #[serde(rename = "OwnerEmployeeID", default)]
    owner_id: Option<employee::Id>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    amount: Decimal,
    currency_code: String,
    #[serde(default)]
    probability: Option<i64>,
    #[serde(with = "rfc3339::option", default)]
    expected_close_date: Option<ExpectedCloseDateTime>,
    stage: i64,
    #[serde(with = "rfc3339::option", default)]
    closed_at: Option<ClosingDateTime>,
    #[serde(default)]
    close_reason: Option<String>,
    #[serde(rename = "ClosedByEmployeeID", default)]
    closed_by: Option<employee::Id>,
    #[serde(default)]
    line_items: Vec<LineItemRecord>,
    #[serde(with = "rfc3339")]
    created_at: CreationDateTime,
    #[serde(with = "rfc3339")]
    updated_at: ModificationDateTime,
}

impl TryFrom<OpportunityRecord> for Opportunity {
    type Error = record_store::Error;

    fn try_from(rec: OpportunityRecord) -> Result<Self, Self::Error> {
        use record_store::Error as E;

        let stage = Stage::from_code(rec.stage)
            .map_err(|e| E::Malformed(format!("`Opportunity({})`: {e}", rec.id)))?;
        let name = Name::new(&rec.name).ok_or_else(|| {
            E::Malformed(format!("`Opportunity({})` has blank `Name`", rec.id))
        })?;
        let currency = currency(&rec.currency_code)?;
        let line_items = rec
            .line_items
            .into_iter()
            .map(LineItem::try_from)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            id: rec.id,
            account_id: rec.account_id,
            contact_id: rec.contact_id,
            owner_id: rec.owner_id,
            name,
            description: rec.description.unwrap_or_default(),
            amount: Money {
                amount: rec.amount,
                currency,
            },
            probability: rec
                .probability
                .map_or(Probability::DEFAULT, Probability::clamped),
            expected_close_at: rec.expected_close_date,
            stage,
            closing: Closing {
                closed_at: rec.closed_at,
                reason: rec.close_reason,
                closed_by: rec.closed_by,
            },
            line_items,
            created_at: rec.created_at,
            updated_at: rec.updated_at,
        })
    }
}

/// Line item as returned by the record store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct LineItemRecord {
    #[serde(rename = "ID")]
    id: line_item::Id,
    #[serde(rename = "ProductID", default)]
    product_id: Option<product::Id>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    unit_price: Decimal,
    #[serde(default)]
    discount_amount: Decimal,
    #[serde(default)]
    discount_percent: Decimal,
    #[serde(default)]
    currency_code: Option<String>,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = record_store::Error;

    fn try_from(rec: LineItemRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(rec.id),
            product_id: rec.product_id,
            quantity: Quantity::new(rec.quantity.unwrap_or(1)),
            unit_price: rec.unit_price.max(Decimal::ZERO),
            discount_amount: rec.discount_amount.max(Decimal::ZERO),
            discount_percent: Percent::clamped(rec.discount_percent),
            currency: rec.currency_code.as_deref().map(currency).transpose()?,
        })
    }
}

/// Product as returned by the record store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ProductRecord {
    #[serde(rename = "ID")]
    id: product::Id,
    name: String,
    #[serde(default)]
    price: Decimal,
    currency_code: String,
}

impl TryFrom<ProductRecord> for Product {
    type Error = record_store::Error;

    fn try_from(rec: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: rec.id,
            name: rec.name,
            price: Money {
                amount: rec.price,
                currency: currency(&rec.currency_code)?,
            },
        })
    }
}

/// Parses the provided raw currency `code`.
fn currency(code: &str) -> Result<CurrencyCode, record_store::Error> {
    CurrencyCode::new(code).ok_or_else(|| {
        record_store::Error::Malformed(format!("invalid `CurrencyCode`: {code}"))
    })
}

/// Body of creating or fully updating an opportunity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct OpportunityBody<'p> {
    #[serde(rename = "AccountID")]
    account_id: account::Id,
    #[serde(rename = "ContactID")]
    contact_id: Option<contact::Id>,
    #[serde(rename = "OwnerEmployeeID")]
    owner_id: Option<employee::Id>,
    name: &'p str,
    description: &'p str,
    amount: Decimal,
    currency_code: &'p str,
    probability: u8,
    #[serde(with = "rfc3339::option")]
    expected_close_date: Option<ExpectedCloseDateTime>,
    stage: u8,
    #[serde(with = "rfc3339::option")]
    closed_at: Option<ClosingDateTime>,
    close_reason: Option<&'p str>,
    #[serde(rename = "ClosedByEmployeeID")]
    closed_by: Option<employee::Id>,
    line_items: Vec<LineItemBody<'p>>,
}

impl<'p> From<&'p Payload> for OpportunityBody<'p> {
    fn from(p: &'p Payload) -> Self {
        Self {
            account_id: p.account_id,
            contact_id: p.contact_id,
            owner_id: p.owner_id,
            name: p.name.as_ref(),
            description: &p.description,
            amount: p.amount.amount,
            currency_code: p.amount.currency.as_str(),
            probability: p.probability.get(),
            expected_close_date: p.expected_close_at,
            stage: p.stage.u8(),
            closed_at: p.closing.closed_at,
            close_reason: p.closing.reason.as_deref(),
            closed_by: p.closing.closed_by,
            line_items: p.line_items.iter().map(LineItemBody::from).collect(),
        }
    }
}

/// Body of a line item within an [`OpportunityBody`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct LineItemBody<'p> {
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    id: Option<line_item::Id>,
    #[serde(rename = "ProductID")]
    product_id: product::Id,
    quantity: u32,
    unit_price: Decimal,
    discount_amount: Decimal,
    discount_percent: Decimal,
    currency_code: &'p str,
    subtotal: Decimal,
    total: Decimal,
}

impl<'p> From<&'p PricedLineItem> for LineItemBody<'p> {
    fn from(i: &'p PricedLineItem) -> Self {
        Self {
            id: i.id,
            product_id: i.product_id,
            quantity: i.quantity.get(),
            unit_price: i.unit_price,
            discount_amount: i.discount_amount,
            discount_percent: i.discount_percent.value(),
            currency_code: i.currency.as_str(),
            subtotal: i.totals.subtotal,
            total: i.totals.total,
        }
    }
}

/// Body of a stage-only partial update.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct StagePatch {
    /// Code of the new stage.
    pub(super) stage: u8,
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::domain::{opportunity::Stage, Opportunity};

    use super::{Collection, OpportunityRecord, StagePatch};

    fn record(stage: u8) -> serde_json::Value {
        json!({
            "ID": "6c1b7c84-43ab-4b4e-9e55-8d6f0f1b3b0a",
            "AccountID": "0b7f2a3c-9f0e-4c55-8a53-1c9c4d1f8e21",
            "OwnerEmployeeID": null,
            "Name": "Fleet renewal",
            "Amount": "125.00",
            "CurrencyCode": "usd",
            "Probability": 140,
            "Stage": stage,
            "CloseReason": null,
            "LineItems": [{
                "ID": "d3f7a7f6-7a43-4e3b-a3e8-3c4a0f5e8e11",
                "ProductID": "a2f1d2a8-3b0e-4f4c-9d6c-5e1f7b9c0d12",
                "Quantity": 0,
                "UnitPrice": 40,
                "DiscountAmount": "0",
                "DiscountPercent": "10.5",
                "CurrencyCode": "USD",
            }],
            "CreatedAt": "2024-03-01T08:00:00Z",
            "UpdatedAt": "2024-03-02T09:30:00.123Z",
        })
    }

    #[test]
    fn decodes_opportunity_record() {
        let rec: OpportunityRecord = serde_json::from_value(record(4)).unwrap();

        let opp = Opportunity::try_from(rec).unwrap();

        assert_eq!(opp.stage, Stage::Proposal);
        assert_eq!(opp.name.to_string(), "Fleet renewal");
        assert_eq!(opp.currency().as_str(), "USD");
        assert_eq!(opp.amount.amount, "125.00".parse::<Decimal>().unwrap());
        assert_eq!(opp.probability.get(), 100);
        assert!(opp.closing.is_empty());
        assert_eq!(opp.line_items.len(), 1);
        assert_eq!(opp.line_items[0].quantity.get(), 1);
        assert_eq!(opp.line_items[0].unit_price, Decimal::from(40));
        assert!(opp.line_items[0].is_priced());
    }

    #[test]
    fn skips_expanded_related_records() {
        let mut raw = record(2);
        raw["StageHistory"] = json!([{ "Stage": 1 }, { "Stage": 2 }]);
        raw["Tasks"] = json!([{ "Subject": "Call back" }]);
        raw["Activities"] = json!([]);

        let rec: OpportunityRecord = serde_json::from_value(raw).unwrap();
        let opp = Opportunity::try_from(rec).unwrap();

        assert_eq!(opp.stage, Stage::Qualification);
        assert_eq!(opp.line_items.len(), 1);
    }

    #[test]
    fn rejects_unknown_stage() {
        let rec: OpportunityRecord = serde_json::from_value(record(9)).unwrap();

        let err = Opportunity::try_from(rec).unwrap_err();

        assert!(err.to_string().contains("invalid stage code: 9"), "{err}");
    }

    #[test]
    fn decodes_collection_envelope() {
        let page: Collection<OpportunityRecord> = serde_json::from_value(
            json!({ "value": [record(1), record(2)], "@odata.count": 7 }),
        )
        .unwrap();

        assert_eq!(page.value.len(), 2);
        assert_eq!(page.count, Some(7));
    }

    #[test]
    fn encodes_stage_patch() {
        assert_eq!(
            serde_json::to_value(StagePatch { stage: 6 }).unwrap(),
            json!({ "Stage": 6 }),
        );
    }
}
