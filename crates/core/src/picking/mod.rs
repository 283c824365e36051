//! Picking state machine.
//!
//! [`ItemPicker`] moves one item's picked quantity between zero and its
//! target, with a two-step confirm-to-remove guard. [`PickList`] holds the
//! pickers for an order and derives the order's forward-only status.
//!
//! Nothing here sleeps or spawns. Callers pass the current [`std::time::Instant`]
//! into every operation and deliver expiry with `expire` once an item's
//! [`ItemPicker::armed_deadline`] has passed. Rejected requests come back as
//! [`PickEvent::GuardViolation`] values instead of errors.

mod events;
mod item;
mod list;
mod tier;

pub use events::{GuardViolation, PickEvent};
pub use item::{DEFAULT_REMOVE_WINDOW, ItemPicker, RemoveGuard};
pub use list::{ItemProgress, PickList, PickListError, check_transition};
pub use tier::PickTier;
