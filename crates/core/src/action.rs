//! Cart mutation intents and the pending-action seam.
//!
//! A [`CartAction`] is the typed description of one cart mutation the buyer
//! has requested. The routing layer encodes an action into a form
//! submission (see [`crate::codec`]), executes it against the commerce API,
//! and exposes the submission as a [`PendingAction`] until it settles. The
//! engine consumes pending actions read-only: it never removes or mutates
//! them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{self, DecodeError};
use crate::types::{Image, Money, SelectedOption};

// =============================================================================
// Action Payload Inputs
// =============================================================================

/// Input for custom attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInput {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

/// Variant data embedded in an add submission so the pending line can be
/// rendered with a title, price, and image before the server responds.
///
/// Everything here is optional: a submission that embeds nothing still adds
/// a line, it just renders with an undetermined price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimisticVariant {
    /// Variant title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    /// Compare-at price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Money>,
    /// Selected options for the variant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Parent product handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_handle: Option<String>,
    /// Parent product title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_title: Option<String>,
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    /// Quantity to add. Non-positive values make this input a no-op.
    pub quantity: i64,
    /// Custom attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeInput>>,
    /// Selling plan ID (for subscriptions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<String>,
    /// Locally-known variant data for optimistic rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<OptimisticVariant>,
}

/// Input for updating a cart line.
///
/// Only quantity and attributes are projected locally. A merchandise or
/// selling-plan swap cannot be predicted without the server's variant data,
/// so those fields ride through to the API untouched by the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity. Zero or negative removes the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// New attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeInput>>,
    /// New merchandise ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchandise_id: Option<String>,
    /// New selling plan ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<String>,
}

/// Input for updating buyer identity. Provided fields replace the current
/// values; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerIdentityInput {
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Input for setting one cart-level metafield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetafieldInput {
    /// Metafield key.
    pub key: String,
    /// Metafield value.
    pub value: String,
}

fn default_replace() -> bool {
    true
}

// =============================================================================
// Cart Actions
// =============================================================================

/// A cart mutation intent.
///
/// The serialized form is the action wire format: an object tagged with the
/// action kind and carrying the kind-specific payload under `inputs`.
/// Adding a kind here is a compile-checked change across the codec and the
/// projector's dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "inputs")]
pub enum CartAction {
    /// Add merchandise lines to the cart.
    LinesAdd {
        /// Lines to add.
        lines: Vec<CartLineInput>,
    },
    /// Update existing lines (quantity, attributes).
    LinesUpdate {
        /// Line updates.
        lines: Vec<CartLineUpdateInput>,
    },
    /// Remove lines by id.
    LinesRemove {
        /// IDs of lines to remove.
        line_ids: Vec<String>,
    },
    /// Replace the cart note.
    NoteUpdate {
        /// The new note.
        note: String,
    },
    /// Replace or extend the applied discount codes.
    DiscountCodesUpdate {
        /// Discount codes, case-preserved.
        discount_codes: Vec<String>,
        /// When true (the default, matching the API), the codes replace the
        /// applied set; when false they are merged into it.
        #[serde(default = "default_replace")]
        replace: bool,
    },
    /// Replace the applied gift-card codes with the given set.
    GiftCardCodesUpdate {
        /// The full desired set of gift-card codes.
        gift_card_codes: Vec<String>,
    },
    /// Choose delivery options per delivery group.
    SelectedDeliveryOptionUpdate {
        /// One entry per delivery group to change.
        selected_delivery_options: Vec<SelectedDeliveryOptionInput>,
    },
    /// Update buyer country/currency context.
    BuyerIdentityUpdate {
        /// Fields to replace.
        buyer_identity: BuyerIdentityInput,
    },
    /// Set cart-level metafields (last-write-wins per key).
    MetafieldsSet {
        /// Metafields to set.
        metafields: Vec<MetafieldInput>,
    },
}

/// Input selecting a delivery option for one delivery group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDeliveryOptionInput {
    /// Delivery group ID.
    pub delivery_group_id: String,
    /// Handle of the chosen delivery option.
    pub delivery_option_handle: String,
}

impl CartAction {
    /// The wire names of every action kind, in declaration order.
    pub const KIND_NAMES: [&'static str; 9] = [
        "LinesAdd",
        "LinesUpdate",
        "LinesRemove",
        "NoteUpdate",
        "DiscountCodesUpdate",
        "GiftCardCodesUpdate",
        "SelectedDeliveryOptionUpdate",
        "BuyerIdentityUpdate",
        "MetafieldsSet",
    ];

    /// The wire name of this action's kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::LinesAdd { .. } => "LinesAdd",
            Self::LinesUpdate { .. } => "LinesUpdate",
            Self::LinesRemove { .. } => "LinesRemove",
            Self::NoteUpdate { .. } => "NoteUpdate",
            Self::DiscountCodesUpdate { .. } => "DiscountCodesUpdate",
            Self::GiftCardCodesUpdate { .. } => "GiftCardCodesUpdate",
            Self::SelectedDeliveryOptionUpdate { .. } => "SelectedDeliveryOptionUpdate",
            Self::BuyerIdentityUpdate { .. } => "BuyerIdentityUpdate",
            Self::MetafieldsSet { .. } => "MetafieldsSet",
        }
    }
}

// =============================================================================
// Pending Actions
// =============================================================================

/// An in-flight cart mutation: submitted, not yet settled.
///
/// Owned by the routing layer's submission lifecycle - created on submit,
/// removed once the request settles. The engine only reads these, decoding
/// [`input`](Self::input) on every projection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// The encoded action string, exactly as placed in the form submission.
    pub input: String,
    /// Client-assigned ID correlating a pending line with the confirmed
    /// line the server later issues for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl PendingAction {
    /// Encode an action into a pending record with no correlation id.
    ///
    /// # Errors
    /// Returns the underlying serialization error if the action cannot be
    /// encoded.
    pub fn new(action: &CartAction) -> Result<Self, serde_json::Error> {
        Ok(Self {
            input: codec::encode(action)?,
            correlation_id: None,
        })
    }

    /// Encode an action into a pending record with a freshly generated
    /// correlation id.
    ///
    /// # Errors
    /// Returns the underlying serialization error if the action cannot be
    /// encoded.
    pub fn with_correlation(action: &CartAction) -> Result<Self, serde_json::Error> {
        Ok(Self {
            input: codec::encode(action)?,
            correlation_id: Some(Uuid::new_v4().to_string()),
        })
    }

    /// Decode the submitted action string back into a typed action.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] when the stored input is malformed or names
    /// an unrecognized action kind.
    pub fn decode(&self) -> Result<CartAction, DecodeError> {
        codec::decode(&self.input)
    }
}

/// Source of in-flight actions, in submission order (oldest first).
///
/// Implemented by the routing layer over its live submissions. The Vec and
/// slice implementations below cover tests and callers that already hold
/// the list.
pub trait PendingActionSource {
    /// Enumerate all currently in-flight actions.
    fn list_pending(&self) -> Vec<PendingAction>;
}

impl PendingActionSource for Vec<PendingAction> {
    fn list_pending(&self) -> Vec<PendingAction> {
        self.clone()
    }
}

impl PendingActionSource for &[PendingAction] {
    fn list_pending(&self) -> Vec<PendingAction> {
        self.to_vec()
    }
}
