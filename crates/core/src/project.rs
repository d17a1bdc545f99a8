//! The reconciliation fold.
//!
//! [`project`] overlays pending actions onto the last server-confirmed cart
//! snapshot: clone the base (or synthesize an empty cart when none exists),
//! fold the actions in submission order, recompute the quantity aggregate.
//! The base cart is never mutated; every call is a fresh fold, safe to run
//! once per render.
//!
//! A single undecodable action is skipped with a diagnostic - it must never
//! abort projection of the others. Monetary cart totals are deliberately
//! left as the base cart reported them: true totals need server-side
//! pricing, tax, and discount evaluation.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::action::{
    BuyerIdentityInput, CartAction, CartLineUpdateInput, PendingAction,
    SelectedDeliveryOptionInput,
};
use crate::synthesize;
use crate::types::{
    AppliedGiftCard, Attribute, Cart, CartBuyerIdentity, CartDiscountCode,
    CartSelectedDeliveryOption,
};

/// A structurally invalid base cart.
///
/// This is a collaborator bug, not a runtime condition to recover from:
/// the server round-trip owns the base cart and must never produce these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two lines in the base cart share an id.
    #[error("duplicate cart line id: {0}")]
    DuplicateLineId(String),

    /// A base cart line carries a non-positive quantity.
    #[error("cart line {id} has non-positive quantity {quantity}")]
    NonPositiveLineQuantity {
        /// The offending line id.
        id: String,
        /// The offending quantity.
        quantity: i64,
    },
}

/// The result of one projection pass: the working cart after the fold, plus
/// how many pending actions were actually applied.
///
/// Ephemeral by design - recomputed on every render, safe to discard.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCart {
    /// The cart after all applied actions.
    pub cart: Cart,
    /// Number of pending actions that decoded and dispatched (no-op
    /// dispatches count; skipped undecodable entries do not).
    pub applied_actions: usize,
}

/// Fold pending actions onto a base cart snapshot.
///
/// Deterministic: equal inputs yield structurally equal output, so the
/// rendering layer can diff projections without spurious re-renders.
///
/// # Errors
/// Returns [`InvariantViolation`] when the base cart itself is structurally
/// invalid. Malformed individual actions are skipped, never an error.
pub fn project(
    base: Option<&Cart>,
    pending: &[PendingAction],
) -> Result<ProjectedCart, InvariantViolation> {
    if let Some(cart) = base {
        validate_base(cart)?;
    }

    let mut working = base.cloned().unwrap_or_default();
    let mut applied = 0;

    for entry in pending {
        match entry.decode() {
            Ok(action) => {
                apply(&mut working, &action, entry.correlation_id.as_deref());
                applied += 1;
            }
            Err(error) => {
                debug!(%error, "skipping undecodable pending action");
            }
        }
    }

    working.total_quantity = working.line_quantity_sum();

    Ok(ProjectedCart {
        cart: working,
        applied_actions: applied,
    })
}

fn validate_base(cart: &Cart) -> Result<(), InvariantViolation> {
    let mut seen = HashSet::with_capacity(cart.lines.len());
    for line in &cart.lines {
        if !seen.insert(line.id.as_str()) {
            return Err(InvariantViolation::DuplicateLineId(line.id.clone()));
        }
        if line.quantity <= 0 {
            return Err(InvariantViolation::NonPositiveLineQuantity {
                id: line.id.clone(),
                quantity: line.quantity,
            });
        }
    }
    Ok(())
}

fn apply(working: &mut Cart, action: &CartAction, correlation_id: Option<&str>) {
    match action {
        CartAction::LinesAdd { lines } => {
            synthesize::merge_or_append(&mut working.lines, lines, correlation_id);
        }
        CartAction::LinesUpdate { lines } => apply_lines_update(working, lines),
        CartAction::LinesRemove { line_ids } => apply_lines_remove(working, line_ids),
        CartAction::NoteUpdate { note } => working.note = Some(note.clone()),
        CartAction::DiscountCodesUpdate {
            discount_codes,
            replace,
        } => apply_discount_codes(working, discount_codes, *replace),
        CartAction::GiftCardCodesUpdate { gift_card_codes } => {
            apply_gift_card_codes(working, gift_card_codes);
        }
        CartAction::SelectedDeliveryOptionUpdate {
            selected_delivery_options,
        } => apply_delivery_options(working, selected_delivery_options),
        CartAction::BuyerIdentityUpdate { buyer_identity } => {
            apply_buyer_identity(working, buyer_identity);
        }
        CartAction::MetafieldsSet { metafields } => {
            for metafield in metafields {
                working
                    .metafields
                    .insert(metafield.key.clone(), metafield.value.clone());
            }
        }
    }
}

/// Existence-gated, last-write-wins line updates. A target id that is not
/// in the working cart (already removed, or an unresolved pending line) is
/// silently dropped.
fn apply_lines_update(working: &mut Cart, updates: &[CartLineUpdateInput]) {
    for update in updates {
        let Some(index) = working.lines.iter().position(|line| line.id == update.id) else {
            warn!(line_id = %update.id, "tried to update a line that is not in the cart");
            continue;
        };

        // Zero (or negative) quantity removes the line, matching the
        // commerce API's remove-by-zero-quantity convention.
        if update.quantity.is_some_and(|quantity| quantity <= 0) {
            working.lines.remove(index);
            continue;
        }

        let Some(line) = working.lines.get_mut(index) else {
            continue;
        };
        if let Some(quantity) = update.quantity {
            line.quantity = quantity;
            let unit = line
                .cost
                .as_ref()
                .map(|cost| cost.amount_per_quantity.clone())
                .or_else(|| line.merchandise.price.clone());
            let compare_at = line
                .cost
                .as_ref()
                .and_then(|cost| cost.compare_at_amount_per_quantity.clone())
                .or_else(|| line.merchandise.compare_at_price.clone());
            line.cost = unit.and_then(|unit| {
                synthesize::derive_line_cost(&unit, compare_at.as_ref(), quantity)
            });
        }
        if let Some(attributes) = &update.attributes {
            line.attributes = attributes
                .iter()
                .map(|attribute| Attribute {
                    key: attribute.key.clone(),
                    value: Some(attribute.value.clone()),
                })
                .collect();
        }
        line.is_optimistic = true;
    }
}

fn apply_lines_remove(working: &mut Cart, line_ids: &[String]) {
    for id in line_ids {
        let before = working.lines.len();
        working.lines.retain(|line| line.id != *id);
        if working.lines.len() == before {
            warn!(line_id = %id, "tried to remove a line that is not in the cart");
        }
    }
}

/// Replace (API default) or merge the discount-code set. Codes are
/// case-preserved and de-duplicated; entries already on the cart keep their
/// server-reported applicability.
fn apply_discount_codes(working: &mut Cart, codes: &[String], replace: bool) {
    let mut next: Vec<CartDiscountCode> = if replace {
        Vec::new()
    } else {
        working.discount_codes.clone()
    };
    for code in codes {
        if next.iter().any(|entry| entry.code == *code) {
            continue;
        }
        let entry = working
            .discount_codes
            .iter()
            .find(|entry| entry.code == *code)
            .cloned()
            .unwrap_or_else(|| CartDiscountCode {
                code: code.clone(),
                applicable: true,
            });
        next.push(entry);
    }
    working.discount_codes = next;
}

/// Last characters of a gift-card code, the only fragment a cart exposes.
fn masked_tail(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let start = chars.len().saturating_sub(4);
    chars.iter().skip(start).collect()
}

/// The payload names the full desired code set (the API's replace
/// semantics). Entries already applied are matched by masked fragment and
/// keep their server-known amounts; new codes appear with no amount until
/// the server confirms.
fn apply_gift_card_codes(working: &mut Cart, codes: &[String]) {
    let mut next: Vec<AppliedGiftCard> = Vec::with_capacity(codes.len());
    for code in codes {
        let tail = masked_tail(code);
        if next.iter().any(|card| card.last_characters == tail) {
            continue;
        }
        let card = working
            .applied_gift_cards
            .iter()
            .find(|card| card.last_characters == tail)
            .cloned()
            .unwrap_or(AppliedGiftCard {
                last_characters: tail,
                amount_used: None,
            });
        next.push(card);
    }
    working.applied_gift_cards = next;
}

fn apply_delivery_options(working: &mut Cart, inputs: &[SelectedDeliveryOptionInput]) {
    for input in inputs {
        let existing = working
            .selected_delivery_options
            .iter_mut()
            .find(|option| option.delivery_group_id == input.delivery_group_id);
        if let Some(option) = existing {
            option.delivery_option_handle = input.delivery_option_handle.clone();
        } else {
            working
                .selected_delivery_options
                .push(CartSelectedDeliveryOption {
                    delivery_group_id: input.delivery_group_id.clone(),
                    delivery_option_handle: input.delivery_option_handle.clone(),
                });
        }
    }
}

fn apply_buyer_identity(working: &mut Cart, input: &BuyerIdentityInput) {
    let identity = working
        .buyer_identity
        .get_or_insert_with(CartBuyerIdentity::default);
    if let Some(email) = &input.email {
        identity.email = Some(email.clone());
    }
    if let Some(phone) = &input.phone {
        identity.phone = Some(phone.clone());
    }
    if let Some(country_code) = &input.country_code {
        identity.country_code = Some(country_code.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action::{CartLineInput, MetafieldInput};
    use crate::types::{CartLine, CartMerchandise, Money};

    fn pending(action: &CartAction) -> PendingAction {
        PendingAction::new(action).unwrap()
    }

    fn lines_add(merchandise_id: &str, quantity: i64) -> CartAction {
        CartAction::LinesAdd {
            lines: vec![CartLineInput {
                merchandise_id: merchandise_id.to_string(),
                quantity,
                attributes: None,
                selling_plan_id: None,
                selected_variant: None,
            }],
        }
    }

    fn server_line(id: &str, merchandise_id: &str, quantity: i64) -> CartLine {
        CartLine {
            id: id.to_string(),
            quantity,
            attributes: Vec::new(),
            cost: None,
            merchandise: CartMerchandise::from_id(merchandise_id),
            is_optimistic: false,
        }
    }

    fn base_cart_with_line() -> Cart {
        let mut cart = Cart::empty();
        cart.id = Some("gid://shop/Cart/base".to_string());
        cart.lines.push(server_line("line-1", "variant-a", 1));
        cart.total_quantity = 1;
        cart
    }

    #[test]
    fn test_no_pending_actions_is_a_pass_through() {
        let base = base_cart_with_line();
        let projected = project(Some(&base), &[]).unwrap();
        assert_eq!(projected.cart, base);
        assert_eq!(projected.applied_actions, 0);
    }

    #[test]
    fn test_projection_is_deterministic() {
        let base = base_cart_with_line();
        let pending = vec![
            pending(&lines_add("variant-a", 2)),
            pending(&CartAction::NoteUpdate {
                note: "gift".to_string(),
            }),
        ];
        let first = project(Some(&base), &pending).unwrap();
        let second = project(Some(&base), &pending).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_base_cart_is_not_mutated() {
        let base = base_cart_with_line();
        let snapshot = base.clone();
        let pending = vec![pending(&lines_add("variant-b", 5))];
        let _ = project(Some(&base), &pending).unwrap();
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_add_then_remove_the_synthesized_line() {
        let pending = vec![
            pending(&lines_add("variant-x", 1)),
            pending(&CartAction::LinesRemove {
                line_ids: vec!["optimistic-variant-x".to_string()],
            }),
        ];
        let projected = project(None, &pending).unwrap();
        assert!(projected.cart.lines.is_empty());
        assert_eq!(projected.applied_actions, 2);
    }

    #[test]
    fn test_remove_before_add_is_order_sensitive() {
        // Reversed order: the remove targets an id that does not exist yet,
        // so the line survives.
        let pending = vec![
            pending(&CartAction::LinesRemove {
                line_ids: vec!["optimistic-variant-x".to_string()],
            }),
            pending(&lines_add("variant-x", 1)),
        ];
        let projected = project(None, &pending).unwrap();
        assert_eq!(projected.cart.lines.len(), 1);
    }

    #[test]
    fn test_malformed_action_does_not_abort_the_fold() {
        let mut pending = vec![
            pending(&lines_add("variant-a", 1)),
            PendingAction {
                input: "{definitely not json".to_string(),
                correlation_id: None,
            },
            pending(&CartAction::NoteUpdate {
                note: "still applied".to_string(),
            }),
        ];
        let with_bad = project(None, &pending).unwrap();

        pending.remove(1);
        let without_bad = project(None, &pending).unwrap();

        assert_eq!(with_bad.cart, without_bad.cart);
        assert_eq!(with_bad.applied_actions, 2);
    }

    #[test]
    fn test_update_quantity_marks_line_optimistic() {
        let base = base_cart_with_line();
        let pending = vec![pending(&CartAction::LinesUpdate {
            lines: vec![CartLineUpdateInput {
                id: "line-1".to_string(),
                quantity: Some(4),
                attributes: None,
                merchandise_id: None,
                selling_plan_id: None,
            }],
        })];
        let projected = project(Some(&base), &pending).unwrap();
        let line = projected.cart.lines.first().unwrap();
        assert_eq!(line.quantity, 4);
        assert!(line.is_optimistic);
        assert_eq!(projected.cart.total_quantity, 4);
    }

    #[test]
    fn test_update_to_zero_quantity_removes_the_line() {
        let base = base_cart_with_line();
        let pending = vec![pending(&CartAction::LinesUpdate {
            lines: vec![CartLineUpdateInput {
                id: "line-1".to_string(),
                quantity: Some(0),
                attributes: None,
                merchandise_id: None,
                selling_plan_id: None,
            }],
        })];
        let projected = project(Some(&base), &pending).unwrap();
        assert!(projected.cart.lines.is_empty());
        assert_eq!(projected.cart.total_quantity, 0);
    }

    #[test]
    fn test_update_of_missing_line_is_silently_dropped() {
        let base = base_cart_with_line();
        let pending = vec![pending(&CartAction::LinesUpdate {
            lines: vec![CartLineUpdateInput {
                id: "no-such-line".to_string(),
                quantity: Some(9),
                attributes: None,
                merchandise_id: None,
                selling_plan_id: None,
            }],
        })];
        let projected = project(Some(&base), &pending).unwrap();
        assert_eq!(projected.cart.lines, base.lines);
        assert_eq!(projected.applied_actions, 1);
    }

    #[test]
    fn test_note_updates_are_last_write_wins() {
        let pending = vec![
            pending(&CartAction::NoteUpdate {
                note: "a".to_string(),
            }),
            pending(&CartAction::NoteUpdate {
                note: "b".to_string(),
            }),
        ];
        let projected = project(None, &pending).unwrap();
        assert_eq!(projected.cart.note.as_deref(), Some("b"));
    }

    #[test]
    fn test_discount_codes_replace_and_dedupe() {
        let mut base = Cart::empty();
        base.discount_codes.push(CartDiscountCode {
            code: "WELCOME".to_string(),
            applicable: false,
        });
        let pending = vec![pending(&CartAction::DiscountCodesUpdate {
            discount_codes: vec![
                "WELCOME".to_string(),
                "Summer".to_string(),
                "Summer".to_string(),
            ],
            replace: true,
        })];
        let projected = project(Some(&base), &pending).unwrap();
        let codes: Vec<(&str, bool)> = projected
            .cart
            .discount_codes
            .iter()
            .map(|entry| (entry.code.as_str(), entry.applicable))
            .collect();
        // Case preserved, de-duplicated, server applicability kept.
        assert_eq!(codes, vec![("WELCOME", false), ("Summer", true)]);
    }

    #[test]
    fn test_discount_codes_merge_mode_keeps_existing() {
        let mut base = Cart::empty();
        base.discount_codes.push(CartDiscountCode {
            code: "WELCOME".to_string(),
            applicable: true,
        });
        let pending = vec![pending(&CartAction::DiscountCodesUpdate {
            discount_codes: vec!["EXTRA".to_string()],
            replace: false,
        })];
        let projected = project(Some(&base), &pending).unwrap();
        assert_eq!(projected.cart.discount_codes.len(), 2);
    }

    #[test]
    fn test_gift_card_codes_keep_confirmed_amounts() {
        let mut base = Cart::empty();
        base.applied_gift_cards.push(AppliedGiftCard {
            last_characters: "1234".to_string(),
            amount_used: Some(Money::new("10.00", "USD")),
        });
        let pending = vec![pending(&CartAction::GiftCardCodesUpdate {
            gift_card_codes: vec!["gc-aaaa-1234".to_string(), "gc-bbbb-5678".to_string()],
        })];
        let projected = project(Some(&base), &pending).unwrap();
        assert_eq!(
            projected.cart.applied_gift_cards,
            vec![
                AppliedGiftCard {
                    last_characters: "1234".to_string(),
                    amount_used: Some(Money::new("10.00", "USD")),
                },
                AppliedGiftCard {
                    last_characters: "5678".to_string(),
                    amount_used: None,
                },
            ]
        );
    }

    #[test]
    fn test_gift_card_codes_drop_unlisted_entries() {
        let mut base = Cart::empty();
        base.applied_gift_cards.push(AppliedGiftCard {
            last_characters: "1234".to_string(),
            amount_used: None,
        });
        let pending = vec![pending(&CartAction::GiftCardCodesUpdate {
            gift_card_codes: Vec::new(),
        })];
        let projected = project(Some(&base), &pending).unwrap();
        assert!(projected.cart.applied_gift_cards.is_empty());
    }

    #[test]
    fn test_delivery_option_upsert_per_group() {
        let mut base = Cart::empty();
        base.selected_delivery_options
            .push(CartSelectedDeliveryOption {
                delivery_group_id: "group-1".to_string(),
                delivery_option_handle: "standard".to_string(),
            });
        let pending = vec![pending(&CartAction::SelectedDeliveryOptionUpdate {
            selected_delivery_options: vec![
                SelectedDeliveryOptionInput {
                    delivery_group_id: "group-1".to_string(),
                    delivery_option_handle: "express".to_string(),
                },
                SelectedDeliveryOptionInput {
                    delivery_group_id: "group-2".to_string(),
                    delivery_option_handle: "pickup".to_string(),
                },
            ],
        })];
        let projected = project(Some(&base), &pending).unwrap();
        assert_eq!(
            projected.cart.selected_delivery_options,
            vec![
                CartSelectedDeliveryOption {
                    delivery_group_id: "group-1".to_string(),
                    delivery_option_handle: "express".to_string(),
                },
                CartSelectedDeliveryOption {
                    delivery_group_id: "group-2".to_string(),
                    delivery_option_handle: "pickup".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_buyer_identity_merges_provided_fields() {
        let mut base = Cart::empty();
        base.buyer_identity = Some(CartBuyerIdentity {
            email: Some("buyer@example.com".to_string()),
            phone: None,
            country_code: Some("US".to_string()),
            customer: None,
        });
        let pending = vec![pending(&CartAction::BuyerIdentityUpdate {
            buyer_identity: BuyerIdentityInput {
                email: None,
                phone: None,
                country_code: Some("CA".to_string()),
            },
        })];
        let projected = project(Some(&base), &pending).unwrap();
        let identity = projected.cart.buyer_identity.unwrap();
        assert_eq!(identity.country_code.as_deref(), Some("CA"));
        assert_eq!(identity.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn test_metafields_are_last_write_wins_per_key() {
        let pending = vec![
            pending(&CartAction::MetafieldsSet {
                metafields: vec![
                    MetafieldInput {
                        key: "wrap".to_string(),
                        value: "none".to_string(),
                    },
                    MetafieldInput {
                        key: "occasion".to_string(),
                        value: "birthday".to_string(),
                    },
                ],
            }),
            pending(&CartAction::MetafieldsSet {
                metafields: vec![MetafieldInput {
                    key: "wrap".to_string(),
                    value: "gift".to_string(),
                }],
            }),
        ];
        let projected = project(None, &pending).unwrap();
        assert_eq!(
            projected.cart.metafields.get("wrap").map(String::as_str),
            Some("gift")
        );
        assert_eq!(
            projected
                .cart
                .metafields
                .get("occasion")
                .map(String::as_str),
            Some("birthday")
        );
    }

    #[test]
    fn test_duplicate_base_line_ids_violate_invariants() {
        let mut base = Cart::empty();
        base.lines.push(server_line("line-1", "variant-a", 1));
        base.lines.push(server_line("line-1", "variant-b", 1));
        let err = project(Some(&base), &[]).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::DuplicateLineId("line-1".to_string())
        );
    }

    #[test]
    fn test_non_positive_base_quantity_violates_invariants() {
        let mut base = Cart::empty();
        base.lines.push(server_line("line-1", "variant-a", -2));
        let err = project(Some(&base), &[]).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::NonPositiveLineQuantity {
                id: "line-1".to_string(),
                quantity: -2,
            }
        );
    }

    #[test]
    fn test_total_quantity_matches_line_sum_after_fold() {
        let base = base_cart_with_line();
        let pending = vec![
            pending(&lines_add("variant-a", 2)),
            pending(&lines_add("variant-b", 3)),
        ];
        let projected = project(Some(&base), &pending).unwrap();
        assert_eq!(
            projected.cart.total_quantity,
            projected.cart.line_quantity_sum()
        );
        assert_eq!(projected.cart.total_quantity, 6);
    }

    #[test]
    fn test_monetary_totals_are_not_recomputed() {
        let mut base = base_cart_with_line();
        base.cost = Some(crate::types::CartCost {
            subtotal_amount: Money::new("629.95", "USD"),
            total_amount: Money::new("629.95", "USD"),
            total_tax_amount: None,
            total_duty_amount: None,
        });
        let pending = vec![pending(&lines_add("variant-a", 10))];
        let projected = project(Some(&base), &pending).unwrap();
        // Quantity moved, money did not.
        assert_eq!(projected.cart.total_quantity, 11);
        assert_eq!(projected.cart.cost, base.cost);
    }
}
