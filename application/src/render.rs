//! Plain text rendering of the console screens.

use std::io;

use service::{
    controller::board::{Column, Moved},
    domain::opportunity::{Draft, Opportunity},
};

/// Renders the provided board `columns` into the provided `out`put.
///
/// # Errors
///
/// If writing into the `out`put fails.
pub fn board(out: &mut impl io::Write, columns: &[Column]) -> io::Result<()> {
    for Column {
        stage,
        opportunities,
        subtotal,
    } in columns
    {
        writeln!(
            out,
            "{stage} ({}) subtotal: {subtotal:.2}",
            opportunities.len(),
        )?;
        for opp in opportunities {
            card(out, opp)?;
        }
    }
    Ok(())
}

fn card(out: &mut impl io::Write, opp: &Opportunity) -> io::Result<()> {
    writeln!(
        out,
        "  {} {} [{}%] {}",
        opp.id, opp.name, opp.probability, opp.amount,
    )
}

/// Renders the outcome of moving the [`Opportunity`] with the provided `id`.
///
/// # Errors
///
/// If writing into the `out`put fails.
pub fn moved(
    out: &mut impl io::Write,
    id: impl std::fmt::Display,
    outcome: Moved,
) -> io::Result<()> {
    match outcome {
        Moved::Unchanged => writeln!(out, "`{id}` is already in place"),
        Moved::Confirmed => writeln!(out, "`{id}` moved"),
    }
}

/// Renders the provided [`Draft`] along with its live totals.
///
/// # Errors
///
/// If writing into the `out`put fails.
pub fn draft(out: &mut impl io::Write, draft: &Draft) -> io::Result<()> {
    let currency = &draft.currency;

    writeln!(out, "{} [{}]", draft.name, draft.stage())?;
    if let Some(reason) = draft.closing().non_blank_reason() {
        writeln!(out, "  close reason: {reason}")?;
    }
    for (n, item) in draft.line_items().iter().enumerate() {
        let Some(product_id) = item.product_id else {
            writeln!(out, "  #{n} <no product>")?;
            continue;
        };
        let totals = item.totals();
        writeln!(
            out,
            "  #{n} {product_id} {} x {:.2} -{:.2} -{}% = {:.2} {currency}",
            item.quantity.get(),
            item.unit_price,
            item.discount_amount,
            item.discount_percent.value(),
            totals.total,
        )?;
    }

    let totals = draft.totals();
    writeln!(out, "subtotal: {:.2} {currency}", totals.subtotal)?;
    writeln!(out, "discount: {:.2} {currency}", totals.discount())?;
    writeln!(out, "total:    {:.2} {currency}", totals.total)
}
