//! Cart domain types.
//!
//! These types mirror the commerce API's cart response, flattened into a
//! clean, ergonomic shape. The same types describe both server-confirmed
//! carts and the projected carts the engine derives from them; fields the
//! engine cannot know locally (costs of pending lines, gift-card amounts)
//! are optional so a projection can leave them undetermined instead of
//! guessing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(amount: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency_code: currency_code.into(),
        }
    }
}

/// Cart cost summary.
///
/// Totals come from server-side pricing, tax, and discount evaluation.
/// The engine never recomputes them: a projected cart carries whatever the
/// base snapshot held, and `None` when no server cart exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal_amount: Money,
    /// Total amount.
    pub total_amount: Money,
    /// Total tax amount.
    pub total_tax_amount: Option<Money>,
    /// Total duty amount.
    pub total_duty_amount: Option<Money>,
}

// =============================================================================
// Image & Option Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image ID.
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Custom attribute (key-value pair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: Option<String>,
}

// =============================================================================
// Merchandise Types
// =============================================================================

/// Merchandise in a cart line (simplified product variant info).
///
/// For server-confirmed lines every field is populated. For lines a pending
/// add introduced, only what the submission embedded is known - at minimum
/// the variant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: Option<String>,
    /// Current unit price.
    pub price: Option<Money>,
    /// Compare-at price.
    pub compare_at_price: Option<Money>,
    /// Selected options.
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product info.
    pub product: Option<CartMerchandiseProduct>,
}

impl CartMerchandise {
    /// Merchandise known only by its variant id.
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            price: None,
            compare_at_price: None,
            selected_options: Vec::new(),
            image: None,
            product: None,
        }
    }
}

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: Option<String>,
    /// Product handle.
    pub handle: Option<String>,
    /// Product title.
    pub title: Option<String>,
    /// Vendor.
    pub vendor: Option<String>,
}

// =============================================================================
// Cart Line Types
// =============================================================================

/// Cost for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Compare-at price per unit.
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Subtotal (before discounts).
    pub subtotal_amount: Money,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID. Server-issued for confirmed lines; lines introduced by
    /// a pending add carry a synthesized id (see
    /// [`crate::synthesize::is_optimistic_line_id`]).
    pub id: String,
    /// Quantity. Always positive; a zero-quantity update removes the line.
    pub quantity: i64,
    /// Custom attributes.
    pub attributes: Vec<Attribute>,
    /// Line cost. `None` when no unit price is locally known.
    pub cost: Option<CartLineCost>,
    /// Product variant.
    pub merchandise: CartMerchandise,
    /// Whether this line reflects a pending, unconfirmed mutation.
    #[serde(default)]
    pub is_optimistic: bool,
}

// =============================================================================
// Buyer Identity Types
// =============================================================================

/// Customer info in buyer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCustomer {
    /// Customer ID.
    pub id: String,
    /// Email.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// Buyer identity for the cart (country/currency context).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartBuyerIdentity {
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Country code.
    pub country_code: Option<String>,
    /// Logged-in customer.
    pub customer: Option<CartCustomer>,
}

// =============================================================================
// Discount & Gift Card Types
// =============================================================================

/// Discount code applied to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code, case-preserved.
    pub code: String,
    /// Whether the code is applicable. Codes a pending action applied are
    /// assumed applicable until the server responds.
    pub applicable: bool,
}

/// Gift card applied to cart.
///
/// The API only ever exposes the masked tail of a gift-card code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedGiftCard {
    /// Last characters of the gift-card code.
    pub last_characters: String,
    /// Amount drawn from the card. `None` until the server confirms.
    pub amount_used: Option<Money>,
}

// =============================================================================
// Delivery Types
// =============================================================================

/// Selected delivery option for one delivery group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSelectedDeliveryOption {
    /// Delivery group ID.
    pub delivery_group_id: String,
    /// Handle of the chosen delivery option within the group.
    pub delivery_option_handle: String,
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart.
///
/// Either the authoritative server snapshot or a projection derived from
/// one. Invariants: `total_quantity` equals the sum of line quantities, and
/// no two lines share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID. `None` before the server has issued one.
    pub id: Option<String>,
    /// Checkout URL. `None` before the server has issued one.
    pub checkout_url: Option<String>,
    /// Cart note.
    pub note: Option<String>,
    /// Total item quantity (sum of line quantities).
    pub total_quantity: i64,
    /// Custom attributes.
    pub attributes: Vec<Attribute>,
    /// Buyer identity.
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// Cart cost summary. Never derived locally.
    pub cost: Option<CartCost>,
    /// Applied discount codes.
    pub discount_codes: Vec<CartDiscountCode>,
    /// Applied gift cards.
    pub applied_gift_cards: Vec<AppliedGiftCard>,
    /// Selected delivery options, one entry per delivery group.
    pub selected_delivery_options: Vec<CartSelectedDeliveryOption>,
    /// Cart-level metafields.
    pub metafields: BTreeMap<String, String>,
    /// Cart lines, in display order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart with no server identity.
    ///
    /// Used as the working base when projecting pending actions before any
    /// server cart exists.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn line_quantity_sum(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}
