//! [`Draft`] of an [`Opportunity`] being edited.

use common::{CurrencyCode, Money, Percent};
use rust_decimal::Decimal;

use crate::domain::{account, contact, employee, product};

use super::{
    line_item::{self, Quantity},
    pricing::{self, Totals},
    stage::{Progress, Requirements},
    Closing, ClosingDateTime, ExpectedCloseDateTime, Id, LineItem, Name,
    Opportunity, Probability, Stage, ValidationError,
};

/// Values new [`Opportunity`] [`Draft`]s are seeded with.
#[derive(Clone, Debug)]
pub struct Defaults {
    /// Currency of new [`Opportunity`]s.
    pub currency: CurrencyCode,

    /// [`Probability`] of new [`Opportunity`]s.
    pub probability: Probability,
}

/// In-progress, unsaved edit state of an [`Opportunity`].
///
/// All the edits are applied synchronously and in call order, and the
/// [`Totals`] are recomputed right away.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// ID of the edited [`Opportunity`], or [`None`] if it's a new one.
    pub id: Option<Id>,

    /// ID of the account owning the [`Opportunity`].
    pub account_id: Option<account::Id>,

    /// ID of the contact person of the [`Opportunity`].
    pub contact_id: Option<contact::Id>,

    /// ID of the employee owning the [`Opportunity`].
    pub owner_id: Option<employee::Id>,

    /// Raw name of the [`Opportunity`], validated when saving.
    pub name: String,

    /// Description of the [`Opportunity`].
    pub description: String,

    /// Currency of the [`Opportunity`] all the [`LineItem`]s must match.
    pub currency: CurrencyCode,

    /// Chance of winning the [`Opportunity`].
    pub probability: Probability,

    /// Expected moment of closing the [`Opportunity`].
    pub expected_close_at: Option<ExpectedCloseDateTime>,

    /// [`Stage`] and [`Closing`] metadata.
    progress: Progress,

    /// Drafted [`LineItem`]s. Never empty.
    line_items: Vec<LineItem>,
}

impl Draft {
    /// Creates a [`Draft`] of a new [`Opportunity`].
    ///
    /// It starts in [`Stage::FIRST`] with a single empty [`LineItem`].
    #[must_use]
    pub fn new(defaults: &Defaults) -> Self {
        Self {
            id: None,
            account_id: None,
            contact_id: None,
            owner_id: None,
            name: String::new(),
            description: String::new(),
            currency: defaults.currency.clone(),
            probability: defaults.probability,
            expected_close_at: None,
            progress: Progress::default(),
            line_items: vec![LineItem::default()],
        }
    }

    /// Returns the [`Stage`] of this [`Draft`].
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.progress.stage
    }

    /// Returns the [`Closing`] metadata of this [`Draft`].
    #[must_use]
    pub fn closing(&self) -> &Closing {
        &self.progress.closing
    }

    /// Returns the [`LineItem`]s of this [`Draft`].
    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Computes the live [`Totals`] of this [`Draft`].
    ///
    /// Only priced [`LineItem`]s count, exactly as they do once saved.
    #[must_use]
    pub fn totals(&self) -> Totals {
        pricing::aggregate(self.line_items.iter().filter(|i| i.is_priced()))
    }

    /// Applies the provided [`line_item::Patch`] to the [`LineItem`] at the
    /// provided `index`, and returns the recomputed [`Totals`].
    ///
    /// # Errors
    ///
    /// - [`ValidationError::LineItemOutOfRange`] if there is no such
    ///   [`LineItem`] (nothing is changed then).
    /// - [`ValidationError::CurrencyMismatch`] if the selected product is
    ///   priced in another currency.
    /// - [`ValidationError::AmountOverflow`] if the line became too large.
    ///
    /// The failed edits are kept, so they're visible, but block saving until
    /// fixed.
    pub fn set_line_item(
        &mut self,
        index: usize,
        patch: line_item::Patch,
    ) -> Result<Totals, ValidationError> {
        self.line_items
            .get_mut(index)
            .ok_or(ValidationError::LineItemOutOfRange(index))?
            .apply(patch);
        self.check_currency(index)?;
        let totals = self.totals();
        if !totals.is_within_bounds() {
            return Err(ValidationError::AmountOverflow);
        }
        Ok(totals)
    }

    /// Appends a new empty [`LineItem`] and returns its index.
    pub fn add_line_item(&mut self) -> usize {
        self.line_items.push(LineItem::default());
        self.line_items.len() - 1
    }

    /// Removes the [`LineItem`] at the provided `index` and returns the
    /// recomputed [`Totals`].
    ///
    /// Removing the last remaining [`LineItem`] leaves a single empty one
    /// instead.
    ///
    /// # Errors
    ///
    /// With [`ValidationError::LineItemOutOfRange`] if there is no such
    /// [`LineItem`].
    pub fn remove_line_item(
        &mut self,
        index: usize,
    ) -> Result<Totals, ValidationError> {
        if index >= self.line_items.len() {
            return Err(ValidationError::LineItemOutOfRange(index));
        }
        _ = self.line_items.remove(index);
        if self.line_items.is_empty() {
            self.line_items.push(LineItem::default());
        }
        Ok(self.totals())
    }

    /// Moves this [`Draft`] into the [`Stage`] with the provided raw `code`.
    ///
    /// # Errors
    ///
    /// With [`ValidationError::InvalidStage`] if the `code` is not a known
    /// [`Stage`]. This [`Draft`] stays unchanged then.
    pub fn set_stage(&mut self, code: i64) -> Result<(), ValidationError> {
        let stage = Stage::from_code(code)?;
        self.progress = self.progress.transition(stage, self.owner_id);
        Ok(())
    }

    /// Sets the free-text close reason.
    pub fn set_close_reason(&mut self, reason: impl Into<String>) {
        self.progress.closing.reason = Some(reason.into());
    }

    /// Sets the moment the [`Opportunity`] was closed.
    pub fn set_closed_at(&mut self, at: Option<ClosingDateTime>) {
        self.progress.closing.closed_at = at;
    }

    /// Sets the employee who closed the [`Opportunity`].
    pub fn set_closed_by(&mut self, by: Option<employee::Id>) {
        self.progress.closing.closed_by = by;
    }

    /// Builds a validated [`Payload`] to be saved into the record store.
    ///
    /// Unpriced [`LineItem`]s are dropped, and the totals are recomputed, so
    /// the [`Payload::amount`] is exactly the sum of the saved
    /// [`LineItem`]s.
    ///
    /// # Errors
    ///
    /// With a [`ValidationError`] if this [`Draft`] cannot be saved.
    pub fn build_save_payload(&self) -> Result<Payload, ValidationError> {
        use ValidationError as E;

        let mut line_items = Vec::with_capacity(self.line_items.len());
        for (index, item) in self.line_items.iter().enumerate() {
            let Some(product_id) = item.product_id else {
                continue;
            };
            self.check_currency(index)?;
            let totals = item.totals();
            if !totals.is_within_bounds() {
                return Err(E::AmountOverflow);
            }
            line_items.push(PricedLineItem {
                id: item.id,
                product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount_amount: item.discount_amount,
                discount_percent: item.discount_percent,
                currency: self.currency.clone(),
                totals,
            });
        }
        if line_items.is_empty() {
            return Err(E::NoPricedLineItems);
        }

        let stage = self.progress.stage;
        let requirements = Requirements::of(stage);
        let closing = requirements.apply(&self.progress.closing, self.owner_id);
        requirements.check(&closing)?;

        let account_id = self.account_id.ok_or(E::AccountRequired)?;
        let name = Name::new(&self.name).ok_or(E::NameRequired)?;

        let totals = line_items.iter().map(|i| i.totals).sum::<Totals>();
        if !totals.is_within_bounds() {
            return Err(E::AmountOverflow);
        }

        Ok(Payload {
            id: self.id,
            account_id,
            contact_id: self.contact_id,
            owner_id: self.owner_id,
            name,
            description: self.description.trim().to_owned(),
            amount: Money {
                amount: totals.total,
                currency: self.currency.clone(),
            }
            .rounded(),
            probability: self.probability,
            expected_close_at: self.expected_close_at,
            stage,
            closing,
            line_items,
        })
    }

    /// Takes over the IDs the record store assigned to the provided `saved`
    /// [`Opportunity`], keeping everything else of this [`Draft`] as is.
    ///
    /// Each newly assigned [`LineItem`] ID goes to the first [`LineItem`]
    /// without an ID having the same product selected.
    pub fn adopt_saved_ids(&mut self, saved: &Opportunity) {
        if self.id.is_none() {
            self.id = Some(saved.id);
        }
        for assigned in &saved.line_items {
            let Some(id) = assigned.id else {
                continue;
            };
            if self.line_items.iter().any(|i| i.id == Some(id)) {
                continue;
            }
            if let Some(item) = self.line_items.iter_mut().find(|i| {
                i.id.is_none() && i.product_id == assigned.product_id
            }) {
                item.id = Some(id);
            }
        }
    }

    /// Checks the currency of the [`LineItem`] at the provided `index`
    /// matches the currency of this [`Draft`].
    fn check_currency(&self, index: usize) -> Result<(), ValidationError> {
        match self.line_items.get(index).and_then(|i| i.currency.as_ref()) {
            Some(actual) if *actual != self.currency => {
                Err(ValidationError::CurrencyMismatch {
                    line: index,
                    expected: self.currency.clone(),
                    actual: actual.clone(),
                })
            }
            Some(_) | None => Ok(()),
        }
    }
}

impl From<&Opportunity> for Draft {
    fn from(opp: &Opportunity) -> Self {
        let mut line_items = opp.line_items.clone();
        if line_items.is_empty() {
            line_items.push(LineItem::default());
        }
        Self {
            id: Some(opp.id),
            account_id: Some(opp.account_id),
            contact_id: opp.contact_id,
            owner_id: opp.owner_id,
            name: opp.name.to_string(),
            description: opp.description.clone(),
            currency: opp.currency().clone(),
            probability: opp.probability,
            expected_close_at: opp.expected_close_at,
            progress: Progress {
                stage: opp.stage,
                closing: opp.closing.clone(),
            },
            line_items,
        }
    }
}

/// Validated [`Opportunity`] fields together with its reconciled
/// [`LineItem`]s, ready to be saved into the record store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payload {
    /// ID of the [`Opportunity`] to update, or [`None`] to create a new one.
    pub id: Option<Id>,

    /// ID of the account owning the [`Opportunity`].
    pub account_id: account::Id,

    /// ID of the contact person of the [`Opportunity`].
    pub contact_id: Option<contact::Id>,

    /// ID of the employee owning the [`Opportunity`].
    pub owner_id: Option<employee::Id>,

    /// [`Name`] of the [`Opportunity`].
    pub name: Name,

    /// Description of the [`Opportunity`].
    pub description: String,

    /// Sum of the [`PricedLineItem`] totals.
    pub amount: Money,

    /// Chance of winning the [`Opportunity`].
    pub probability: Probability,

    /// Expected moment of closing the [`Opportunity`].
    pub expected_close_at: Option<ExpectedCloseDateTime>,

    /// [`Stage`] of the [`Opportunity`].
    pub stage: Stage,

    /// [`Closing`] metadata, normalized for the [`Stage`].
    pub closing: Closing,

    /// [`LineItem`]s having a product selected.
    pub line_items: Vec<PricedLineItem>,
}

/// [`LineItem`] of a [`Payload`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PricedLineItem {
    /// ID of the [`LineItem`], or [`None`] if it wasn't saved yet.
    pub id: Option<line_item::Id>,

    /// ID of the priced product.
    pub product_id: product::Id,

    /// [`Quantity`] of the product units.
    pub quantity: Quantity,

    /// Price of a single product unit.
    pub unit_price: Decimal,

    /// Flat discount of the whole line.
    pub discount_amount: Decimal,

    /// Percentage discount of the whole line.
    pub discount_percent: Percent,

    /// Resolved currency of the line.
    pub currency: CurrencyCode,

    /// Computed [`Totals`] of the line.
    pub totals: Totals,
}

#[cfg(test)]
mod spec {
    use common::{CurrencyCode, DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        account, employee,
        opportunity::{line_item::Patch, pricing, Stage, ValidationError},
        product, Product,
    };

    use super::{Defaults, Draft};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    fn defaults() -> Defaults {
        Defaults {
            currency: usd(),
            probability: super::Probability::DEFAULT,
        }
    }

    fn product(price: &str, currency: &str) -> Product {
        Product {
            id: product::Id::new(),
            name: "Seat license".to_owned(),
            price: Money {
                amount: decimal(price),
                currency: CurrencyCode::new(currency).unwrap(),
            },
        }
    }

    fn priced(price: &str, qty: i64, amount: &str, percent: &str) -> Patch {
        Patch {
            product: Some(product(price, "USD")),
            quantity: Some(qty),
            discount_amount: Some(decimal(amount)),
            discount_percent: Some(decimal(percent)),
            ..Patch::default()
        }
    }

    /// Create-mode [`Draft`] with everything but line items filled.
    fn named_draft() -> Draft {
        let mut draft = Draft::new(&defaults());
        draft.name = "Renewal 2025".to_owned();
        draft.account_id = Some(account::Id::new());
        draft
    }

    #[test]
    fn create_mode_defaults() {
        let draft = Draft::new(&defaults());

        assert_eq!(draft.id, None);
        assert_eq!(draft.stage(), Stage::FIRST);
        assert_eq!(draft.probability.get(), 50);
        assert_eq!(draft.line_items().len(), 1);
        assert!(!draft.line_items()[0].is_priced());
        assert!(draft.closing().is_empty());
    }

    #[test]
    fn removing_last_line_item_leaves_an_empty_one() {
        let mut draft = Draft::new(&defaults());

        let totals = draft.remove_line_item(0).unwrap();

        assert_eq!(draft.line_items().len(), 1);
        assert!(!draft.line_items()[0].is_priced());
        assert_eq!(totals, pricing::Totals::ZERO);
    }

    #[test]
    fn removing_out_of_range_fails() {
        let mut draft = Draft::new(&defaults());

        assert_eq!(
            draft.remove_line_item(3),
            Err(ValidationError::LineItemOutOfRange(3)),
        );
        assert_eq!(draft.line_items().len(), 1);
    }

    #[test]
    fn recomputes_totals_on_every_edit() {
        let mut draft = named_draft();

        let totals = draft.set_line_item(0, priced("50.00", 2, "5", "10"));
        assert_eq!(totals.unwrap().total, decimal("85.00"));

        let second = draft.add_line_item();
        let totals = draft.set_line_item(second, priced("40", 1, "0", "0"));
        assert_eq!(totals.unwrap().total, decimal("125.00"));

        let totals = draft.remove_line_item(0).unwrap();
        assert_eq!(totals.total, decimal("40"));
    }

    #[test]
    fn unpriced_lines_do_not_count() {
        let mut draft = named_draft();
        _ = draft
            .set_line_item(
                0,
                Patch {
                    unit_price: Some(decimal("99")),
                    ..Patch::default()
                },
            )
            .unwrap();

        assert_eq!(draft.totals().total, Decimal::ZERO);
    }

    #[test]
    fn currency_mismatch_blocks_saving() {
        let mut draft = named_draft();

        let res = draft.set_line_item(
            0,
            Patch {
                product: Some(product("10", "EUR")),
                ..Patch::default()
            },
        );

        assert_eq!(
            res,
            Err(ValidationError::CurrencyMismatch {
                line: 0,
                expected: usd(),
                actual: CurrencyCode::new("EUR").unwrap(),
            }),
        );
        assert!(draft.line_items()[0].is_priced());
        assert!(matches!(
            draft.build_save_payload(),
            Err(ValidationError::CurrencyMismatch { line: 0, .. }),
        ));
    }

    #[test]
    fn payload_amount_is_sum_of_priced_lines() {
        let mut draft = named_draft();
        _ = draft.set_line_item(0, priced("50.00", 2, "5", "10")).unwrap();
        let empty = draft.add_line_item();
        let third = draft.add_line_item();
        _ = draft.set_line_item(third, priced("40", 1, "0", "0")).unwrap();

        let payload = draft.build_save_payload().unwrap();

        assert_eq!(payload.line_items.len(), 2);
        assert!(empty < third);
        assert_eq!(payload.amount.amount, decimal("125.00"));
        assert_eq!(payload.amount.currency, usd());
        assert_eq!(
            payload.amount.amount,
            pricing::aggregate(
                draft.line_items().iter().filter(|i| i.is_priced()),
            )
            .total,
        );
        assert!(payload.line_items.iter().all(|i| i.currency == usd()));
    }

    #[test]
    fn payload_requires_a_priced_line_item() {
        let draft = named_draft();

        let err = draft.build_save_payload().unwrap_err();

        assert_eq!(err, ValidationError::NoPricedLineItems);
        assert_eq!(err.to_string(), "at least one priced line item is required");
    }

    #[test]
    fn payload_requires_account_and_name() {
        let mut draft = Draft::new(&defaults());
        _ = draft.set_line_item(0, priced("1", 1, "0", "0")).unwrap();

        assert_eq!(
            draft.build_save_payload(),
            Err(ValidationError::AccountRequired),
        );

        draft.account_id = Some(account::Id::new());
        draft.name = "   ".to_owned();
        assert_eq!(
            draft.build_save_payload(),
            Err(ValidationError::NameRequired),
        );
    }

    #[test]
    fn invalid_stage_leaves_draft_unchanged() {
        let mut draft = named_draft();
        draft.set_stage(7).unwrap();
        draft.set_close_reason("lost to competitor");
        let before = draft.clone();

        for code in [0, 8, -3, 300] {
            assert_eq!(
                draft.set_stage(code),
                Err(ValidationError::InvalidStage(code)),
            );
            assert_eq!(draft, before);
        }
    }

    #[test]
    fn closed_lost_requires_reason_to_save() {
        let mut draft = named_draft();
        _ = draft.set_line_item(0, priced("10", 1, "0", "0")).unwrap();
        draft.set_stage(i64::from(Stage::ClosedLost.u8())).unwrap();

        assert_eq!(
            draft.build_save_payload(),
            Err(ValidationError::CloseReasonRequired),
        );

        draft.set_close_reason("  ");
        assert_eq!(
            draft.build_save_payload(),
            Err(ValidationError::CloseReasonRequired),
        );

        draft.set_close_reason("no budget");
        let payload = draft.build_save_payload().unwrap();
        assert_eq!(payload.closing.reason.as_deref(), Some("no budget"));
    }

    #[test]
    fn open_stage_strips_closing_metadata_from_payload() {
        let mut draft = named_draft();
        _ = draft.set_line_item(0, priced("10", 1, "0", "0")).unwrap();
        draft.set_stage(3).unwrap();
        draft.set_close_reason("typed too early");
        draft.set_closed_at(Some(DateTime::now().coerce()));
        draft.set_closed_by(Some(employee::Id::new()));

        let payload = draft.build_save_payload().unwrap();

        assert!(payload.closing.is_empty());
    }

    #[test]
    fn reopening_clears_closing_metadata() {
        let owner = employee::Id::new();
        let mut draft = named_draft();
        draft.owner_id = Some(owner);
        draft.set_stage(6).unwrap();
        draft.set_closed_at(Some(DateTime::now().coerce()));
        draft.set_close_reason("signed");

        assert_eq!(draft.closing().closed_by, Some(owner));

        draft.set_stage(2).unwrap();

        assert!(draft.closing().is_empty());
    }

    #[test]
    fn closed_payload_defaults_closer_to_owner() {
        let owner = employee::Id::new();
        let mut draft = named_draft();
        _ = draft.set_line_item(0, priced("10", 1, "0", "0")).unwrap();
        draft.set_stage(6).unwrap();
        draft.owner_id = Some(owner);

        let payload = draft.build_save_payload().unwrap();

        assert_eq!(payload.closing.closed_by, Some(owner));
    }

    #[test]
    fn huge_line_blocks_saving() {
        let mut draft = named_draft();

        let res = draft.set_line_item(
            0,
            priced("100000000000000000000", i64::MAX, "0", "0"),
        );

        assert_eq!(res, Err(ValidationError::AmountOverflow));
        assert!(draft.line_items()[0].is_priced());
        assert_eq!(
            draft.build_save_payload(),
            Err(ValidationError::AmountOverflow),
        );

        let fixed = Patch {
            quantity: Some(1),
            unit_price: Some(decimal("10")),
            ..Patch::default()
        };
        assert_eq!(draft.set_line_item(0, fixed).unwrap().total, decimal("10"));
        assert!(draft.build_save_payload().is_ok());
    }

    #[test]
    fn oversized_sum_blocks_saving() {
        let mut draft = named_draft();
        let line = || priced("600000000000000000", 1, "0", "0");

        assert!(draft.set_line_item(0, line()).is_ok());
        let second = draft.add_line_item();
        assert_eq!(
            draft.set_line_item(second, line()),
            Err(ValidationError::AmountOverflow),
        );
        assert_eq!(
            draft.build_save_payload(),
            Err(ValidationError::AmountOverflow),
        );
        assert_eq!(ValidationError::AmountOverflow.field(), "LineItems");
    }
}
