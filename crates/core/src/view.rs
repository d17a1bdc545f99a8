//! The optimistic cart handed to the renderer.
//!
//! [`annotate`] turns a [`ProjectedCart`] into the outbound view: the same
//! cart shape plus a cart-level `is_optimistic` flag, with line-level flags
//! finalized. [`optimistic_cart`] is the one-call entry point a render pass
//! uses.

use serde::{Deserialize, Serialize};

use crate::action::{PendingAction, PendingActionSource};
use crate::project::{self, InvariantViolation, ProjectedCart};
use crate::synthesize::is_optimistic_line_id;
use crate::types::Cart;

/// A cart annotated with optimistic-state flags.
///
/// Serializes as the cart's own fields plus `is_optimistic`, so the
/// rendering layer consumes one flat shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisticCart {
    /// The projected cart.
    #[serde(flatten)]
    pub cart: Cart,
    /// True iff at least one pending action was applied this pass.
    pub is_optimistic: bool,
}

/// Finalize optimistic-state flags over a projected cart.
///
/// Lines touched during the fold already carry their flag; this pass
/// additionally catches any line whose id matches the synthesized-id
/// convention. The cart-level flag reflects whether any pending action was
/// applied, no-ops included - "this view may differ from the server" is the
/// signal, not "something visibly changed".
#[must_use]
pub fn annotate(projected: ProjectedCart) -> OptimisticCart {
    let ProjectedCart {
        mut cart,
        applied_actions,
    } = projected;

    for line in &mut cart.lines {
        line.is_optimistic = line.is_optimistic || is_optimistic_line_id(&line.id);
    }

    OptimisticCart {
        cart,
        is_optimistic: applied_actions > 0,
    }
}

/// Project pending actions onto a base cart and annotate the result.
///
/// # Errors
/// Returns [`InvariantViolation`] when the base cart is structurally
/// invalid; see [`project::project`].
pub fn optimistic_cart(
    base: Option<&Cart>,
    pending: &[PendingAction],
) -> Result<OptimisticCart, InvariantViolation> {
    Ok(annotate(project::project(base, pending)?))
}

/// [`optimistic_cart`] over any pending-action source.
///
/// # Errors
/// Returns [`InvariantViolation`] when the base cart is structurally
/// invalid.
pub fn optimistic_cart_from_source(
    base: Option<&Cart>,
    source: &impl PendingActionSource,
) -> Result<OptimisticCart, InvariantViolation> {
    optimistic_cart(base, &source.list_pending())
}
