//! Cartwheel Core - Optimistic cart reconciliation engine.
//!
//! This crate projects in-flight cart mutations onto the last
//! server-confirmed cart snapshot, so a rendering layer can show the
//! predicted cart before the network round-trip completes. Once the server
//! responds, the routing layer drops the settled submissions and the next
//! projection converges on the confirmed state.
//!
//! # Architecture
//!
//! The engine is a pure library - no I/O, no timers, no shared mutable
//! state. Executing the actual cart mutations (and removing settled
//! submissions from the pending list) is the job of the routing layer;
//! this crate only computes views.
//!
//! # Modules
//!
//! - [`types`] - Flattened cart domain types (cart, lines, money, codes)
//! - [`action`] - Cart mutation intents and the pending-action source seam
//! - [`codec`] - Encoding between actions and the form-submission string
//! - [`synthesize`] - Placeholder line synthesis for pending adds
//! - [`project`] - The reconciliation fold over pending actions
//! - [`view`] - The annotated optimistic cart handed to the renderer
//!
//! # Example
//!
//! ```rust
//! use cartwheel_core::action::{CartAction, CartLineInput, PendingAction};
//! use cartwheel_core::view::optimistic_cart;
//!
//! let add = CartAction::LinesAdd {
//!     lines: vec![CartLineInput {
//!         merchandise_id: "gid://shop/ProductVariant/1".into(),
//!         quantity: 2,
//!         attributes: None,
//!         selling_plan_id: None,
//!         selected_variant: None,
//!     }],
//! };
//! let pending = vec![PendingAction::new(&add)?];
//!
//! // No cart exists yet - the projection still renders the pending line.
//! let cart = optimistic_cart(None, &pending)?;
//! assert!(cart.is_optimistic);
//! assert_eq!(cart.cart.total_quantity, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod action;
pub mod codec;
pub mod project;
pub mod synthesize;
pub mod types;
pub mod view;

pub use action::{CartAction, PendingAction, PendingActionSource};
pub use codec::{DecodeError, decode, encode};
pub use project::{InvariantViolation, ProjectedCart, project};
pub use synthesize::{OPTIMISTIC_LINE_ID_PREFIX, is_optimistic_line_id};
pub use types::{Cart, CartLine};
pub use view::{OptimisticCart, annotate, optimistic_cart};
