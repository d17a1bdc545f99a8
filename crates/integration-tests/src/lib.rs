//! Integration tests for Cartwheel.
//!
//! The `tests/` directory drives the public engine surface end-to-end:
//! realistic server cart snapshots plus pending form submissions in, fully
//! annotated optimistic carts out.
//!
//! This crate's library part holds the shared fixtures: server-shaped cart
//! snapshots (ids, costs, full merchandise) modeled on real storefront
//! data, and small builders for the pending actions the scenarios submit.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cartwheel_core::action::{CartAction, CartLineInput, OptimisticVariant, PendingAction};
use cartwheel_core::types::{
    Cart, CartBuyerIdentity, CartCost, CartLine, CartLineCost, CartMerchandise,
    CartMerchandiseProduct, Image, Money, SelectedOption,
};

/// Variant id used by the snowboard fixture line.
pub const SNOWBOARD_VARIANT_ID: &str = "gid://shop/ProductVariant/41007290744888";
/// Line id of the snowboard fixture line.
pub const SNOWBOARD_LINE_ID: &str = "gid://shop/CartLine/53b449e1-6f6d-47ca-94e4-748a055b45e8";
/// Variant id used by the t-shirt fixture line.
pub const TSHIRT_VARIANT_ID: &str = "gid://shop/ProductVariant/43696932126742";
/// Line id of the t-shirt fixture line.
pub const TSHIRT_LINE_ID: &str = "gid://shop/CartLine/6fa571a2-c287-40aa-885c-a55aabcc3205";

/// A server-confirmed cart with identity and costs but no lines.
#[must_use]
pub fn empty_cart() -> Cart {
    Cart {
        id: Some("gid://shop/Cart/Z2NwLXVzLWNlbnRyYWwx".to_string()),
        checkout_url: Some("https://checkout.example.com/cart/c/Z2NwLXVzLWNlbnRyYWwx".to_string()),
        note: None,
        total_quantity: 0,
        attributes: Vec::new(),
        buyer_identity: Some(CartBuyerIdentity {
            email: None,
            phone: None,
            country_code: Some("US".to_string()),
            customer: None,
        }),
        cost: Some(CartCost {
            subtotal_amount: Money::new("0.00", "USD"),
            total_amount: Money::new("0.00", "USD"),
            total_tax_amount: None,
            total_duty_amount: None,
        }),
        discount_codes: Vec::new(),
        applied_gift_cards: Vec::new(),
        selected_delivery_options: Vec::new(),
        metafields: std::collections::BTreeMap::new(),
        lines: Vec::new(),
    }
}

fn snowboard_line() -> CartLine {
    CartLine {
        id: SNOWBOARD_LINE_ID.to_string(),
        quantity: 1,
        attributes: Vec::new(),
        cost: Some(CartLineCost {
            amount_per_quantity: Money::new("629.95", "USD"),
            compare_at_amount_per_quantity: Some(Money::new("799.99", "USD")),
            subtotal_amount: Money::new("629.95", "USD"),
            total_amount: Money::new("629.95", "USD"),
        }),
        merchandise: CartMerchandise {
            id: SNOWBOARD_VARIANT_ID.to_string(),
            title: Some("158cm / Reactive Blue".to_string()),
            price: Some(Money::new("629.95", "USD")),
            compare_at_price: Some(Money::new("799.99", "USD")),
            selected_options: vec![
                SelectedOption {
                    name: "Size".to_string(),
                    value: "158cm".to_string(),
                },
                SelectedOption {
                    name: "Color".to_string(),
                    value: "Reactive Blue".to_string(),
                },
            ],
            image: Some(Image {
                id: Some("gid://shop/ProductImage/36705303822392".to_string()),
                url: "https://cdn.example.com/products/snowboard-main.jpg".to_string(),
                alt_text: None,
                width: Some(3908),
                height: Some(3908),
            }),
            product: Some(CartMerchandiseProduct {
                id: Some("gid://shop/Product/6730943955000".to_string()),
                handle: Some("the-alpine-snowboard".to_string()),
                title: Some("The Alpine Snowboard".to_string()),
                vendor: Some("Snowdevil".to_string()),
            }),
        },
        is_optimistic: false,
    }
}

fn tshirt_line() -> CartLine {
    CartLine {
        id: TSHIRT_LINE_ID.to_string(),
        quantity: 1,
        attributes: Vec::new(),
        cost: Some(CartLineCost {
            amount_per_quantity: Money::new("30.0", "USD"),
            compare_at_amount_per_quantity: None,
            subtotal_amount: Money::new("30.0", "USD"),
            total_amount: Money::new("30.0", "USD"),
        }),
        merchandise: CartMerchandise {
            id: TSHIRT_VARIANT_ID.to_string(),
            title: Some("Small / Green".to_string()),
            price: Some(Money::new("30.0", "USD")),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption {
                    name: "Size".to_string(),
                    value: "Small".to_string(),
                },
                SelectedOption {
                    name: "Color".to_string(),
                    value: "Green".to_string(),
                },
            ],
            image: None,
            product: Some(CartMerchandiseProduct {
                id: Some("gid://shop/Product/7982902771734".to_string()),
                handle: Some("mens-t-shirt".to_string()),
                title: Some("Men's T-shirt".to_string()),
                vendor: Some("Fakestore".to_string()),
            }),
        },
        is_optimistic: false,
    }
}

/// A server-confirmed cart holding one snowboard line.
#[must_use]
pub fn cart_with_line() -> Cart {
    let mut cart = empty_cart();
    cart.lines.push(snowboard_line());
    cart.total_quantity = 1;
    cart.cost = Some(CartCost {
        subtotal_amount: Money::new("629.95", "USD"),
        total_amount: Money::new("629.95", "USD"),
        total_tax_amount: None,
        total_duty_amount: None,
    });
    cart
}

/// A server-confirmed cart holding the snowboard and t-shirt lines.
#[must_use]
pub fn cart_with_two_lines() -> Cart {
    let mut cart = cart_with_line();
    cart.lines.push(tshirt_line());
    cart.total_quantity = 2;
    cart
}

/// A pending `LinesAdd` submission for one variant, embedding no variant
/// data beyond the id.
///
/// # Panics
/// Panics if the action fails to encode, which plain action payloads never
/// do.
#[must_use]
pub fn pending_add(merchandise_id: &str, quantity: i64) -> PendingAction {
    pending_add_with_variant(merchandise_id, quantity, None)
}

/// A pending `LinesAdd` submission with optional embedded variant data.
///
/// # Panics
/// Panics if the action fails to encode, which plain action payloads never
/// do.
#[must_use]
pub fn pending_add_with_variant(
    merchandise_id: &str,
    quantity: i64,
    selected_variant: Option<OptimisticVariant>,
) -> PendingAction {
    let action = CartAction::LinesAdd {
        lines: vec![CartLineInput {
            merchandise_id: merchandise_id.to_string(),
            quantity,
            attributes: None,
            selling_plan_id: None,
            selected_variant,
        }],
    };
    PendingAction::new(&action).expect("action encodes")
}

/// A pending submission for any action.
///
/// # Panics
/// Panics if the action fails to encode, which plain action payloads never
/// do.
#[must_use]
pub fn pending(action: &CartAction) -> PendingAction {
    PendingAction::new(action).expect("action encodes")
}
