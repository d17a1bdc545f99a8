//! Action wire codec.
//!
//! A cart mutation travels from the form to the action handler as a single
//! string field: the JSON encoding of the action kind and its payload. The
//! codec is the only place that string shape is known; everything else
//! works with the typed [`CartAction`].
//!
//! Decoding is fallible per entry and always recoverable: the projector
//! skips an entry it cannot decode and keeps folding the rest.

use thiserror::Error;

use crate::action::CartAction;

/// The form field under which the encoded action is submitted.
pub const FORM_INPUT_NAME: &str = "cart_action";

/// Errors decoding a submitted action string.
///
/// All variants are local to the single offending entry; none abort a
/// projection.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The string is not valid JSON, or the payload does not match the
    /// action kind's expected shape.
    #[error("malformed action input: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON object has no `action` field.
    #[error("action input has no action kind")]
    MissingKind,

    /// The `action` field names a kind this engine does not know.
    #[error("unrecognized action kind: {0}")]
    UnknownKind(String),
}

/// Encode an action into its wire string.
///
/// # Errors
/// Returns the underlying serialization error. In practice action payloads
/// are plain data and always serialize.
pub fn encode(action: &CartAction) -> Result<String, serde_json::Error> {
    serde_json::to_string(action)
}

/// Decode a wire string back into a typed action.
///
/// The kind is checked before the payload so an unknown kind reports as
/// [`DecodeError::UnknownKind`] rather than a generic shape mismatch.
///
/// # Errors
/// See [`DecodeError`].
pub fn decode(input: &str) -> Result<CartAction, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(input)?;

    let Some(kind) = value.get("action").and_then(serde_json::Value::as_str) else {
        return Err(DecodeError::MissingKind);
    };
    if !CartAction::KIND_NAMES.contains(&kind) {
        return Err(DecodeError::UnknownKind(kind.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}
