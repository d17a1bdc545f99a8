//! Placeholder line synthesis for pending adds.
//!
//! A pending `LinesAdd` has no server-issued line id and usually no
//! server-computed cost. This module builds the stand-in lines: either an
//! existing line absorbs the quantity (same variant, no conflicting
//! options), or a new line is appended with a synthesized id and whatever
//! variant data the submission embedded.
//!
//! Synthesized ids are derived from stable inputs (correlation id or
//! variant id), never randomness, so repeated projections of the same
//! inputs are structurally equal.

use rust_decimal::Decimal;
use tracing::warn;

use crate::action::CartLineInput;
use crate::types::{
    Attribute, CartLine, CartLineCost, CartMerchandise, CartMerchandiseProduct, Money,
};

/// Prefix distinguishing synthesized line ids from server-issued ones.
pub const OPTIMISTIC_LINE_ID_PREFIX: &str = "optimistic-";

/// Whether a line id was synthesized by this engine.
///
/// The prefix convention lives behind this predicate (and the constant
/// above) so the detection rule can change without touching the fold.
#[must_use]
pub fn is_optimistic_line_id(id: &str) -> bool {
    id.starts_with(OPTIMISTIC_LINE_ID_PREFIX)
}

/// Build the synthesized id for a pending line.
///
/// The correlation id (when the submission carries one that unambiguously
/// names this line) wins over the variant id; both are stable across
/// repeated projections.
fn synthesized_line_id(merchandise_id: &str, correlation_id: Option<&str>) -> String {
    let key = correlation_id.unwrap_or(merchandise_id);
    format!("{OPTIMISTIC_LINE_ID_PREFIX}{key}")
}

/// Derive a line cost from a known unit price.
///
/// Subtotal and total are unit x quantity in exact decimal arithmetic.
/// Returns `None` (with a diagnostic) when the unit amount does not parse -
/// an undetermined cost renders better than a wrong one.
#[must_use]
pub fn derive_line_cost(
    unit: &Money,
    compare_at: Option<&Money>,
    quantity: i64,
) -> Option<CartLineCost> {
    let Ok(amount) = unit.amount.parse::<Decimal>() else {
        warn!(amount = %unit.amount, "unparsable unit price, leaving line cost undetermined");
        return None;
    };
    let extended = amount * Decimal::from(quantity);
    let extended = Money::new(extended.to_string(), unit.currency_code.as_str());
    Some(CartLineCost {
        amount_per_quantity: unit.clone(),
        compare_at_amount_per_quantity: compare_at.cloned(),
        subtotal_amount: extended.clone(),
        total_amount: extended,
    })
}

/// Synthesize a placeholder line for one add input.
///
/// Returns `None` for non-positive quantities (the input is a no-op, never
/// an error). Cost is populated only when the submission embeds a unit
/// price.
#[must_use]
pub fn synthesize_line(input: &CartLineInput, correlation_id: Option<&str>) -> Option<CartLine> {
    if input.quantity <= 0 {
        return None;
    }

    let mut merchandise = CartMerchandise::from_id(input.merchandise_id.as_str());
    let mut cost = None;
    if let Some(variant) = &input.selected_variant {
        merchandise.title = variant.title.clone();
        merchandise.price = variant.price.clone();
        merchandise.compare_at_price = variant.compare_at_price.clone();
        merchandise.selected_options = variant.selected_options.clone();
        merchandise.image = variant.image.clone();
        if variant.product_handle.is_some() || variant.product_title.is_some() {
            merchandise.product = Some(CartMerchandiseProduct {
                id: None,
                handle: variant.product_handle.clone(),
                title: variant.product_title.clone(),
                vendor: None,
            });
        }
        if let Some(price) = &variant.price {
            cost = derive_line_cost(price, variant.compare_at_price.as_ref(), input.quantity);
        }
    }

    Some(CartLine {
        id: synthesized_line_id(&input.merchandise_id, correlation_id),
        quantity: input.quantity,
        attributes: input
            .attributes
            .iter()
            .flatten()
            .map(|a| Attribute {
                key: a.key.clone(),
                value: Some(a.value.clone()),
            })
            .collect(),
        cost,
        merchandise,
        is_optimistic: true,
    })
}

/// Whether an add input conflicts with an existing line's selected options.
///
/// A conflict only exists when both sides carry options and they disagree;
/// a side that knows nothing cannot conflict.
fn selected_options_conflict(input: &CartLineInput, line: &CartLine) -> bool {
    let Some(variant) = &input.selected_variant else {
        return false;
    };
    if variant.selected_options.is_empty() || line.merchandise.selected_options.is_empty() {
        return false;
    }
    variant.selected_options != line.merchandise.selected_options
}

/// Fold add inputs into the working line list: merge into an existing line
/// for the same variant where possible, otherwise append a synthesized line.
pub(crate) fn merge_or_append(
    working: &mut Vec<CartLine>,
    inputs: &[CartLineInput],
    correlation_id: Option<&str>,
) {
    // A correlation id can only name a line unambiguously when the action
    // adds exactly one.
    let correlation_id = if inputs.len() == 1 { correlation_id } else { None };

    for input in inputs {
        if input.quantity <= 0 {
            continue;
        }

        let merged = working.iter_mut().find(|line| {
            line.merchandise.id == input.merchandise_id && !selected_options_conflict(input, line)
        });
        if let Some(line) = merged {
            line.quantity += input.quantity;
            line.is_optimistic = true;
            // Re-extend the cost from the best unit price available:
            // server-confirmed first, then whatever the submission embedded.
            let unit = line
                .cost
                .as_ref()
                .map(|c| c.amount_per_quantity.clone())
                .or_else(|| line.merchandise.price.clone())
                .or_else(|| {
                    input
                        .selected_variant
                        .as_ref()
                        .and_then(|v| v.price.clone())
                });
            line.cost = unit.as_ref().and_then(|u| {
                derive_line_cost(
                    u,
                    line.merchandise.compare_at_price.as_ref(),
                    line.quantity,
                )
            });
        } else if let Some(mut line) = synthesize_line(input, correlation_id) {
            // Two adds for the same variant with conflicting options would
            // otherwise synthesize the same id; suffix deterministically to
            // keep line ids unique.
            let mut candidate = line.id.clone();
            let mut n = 1;
            while working.iter().any(|l| l.id == candidate) {
                n += 1;
                candidate = format!("{}-{n}", line.id);
            }
            line.id = candidate;
            working.push(line);
        }
    }
}
