//! Signals emitted by the picking state machine.
//!
//! Every event is plain data. Presentation and audio collaborators consume
//! them; nothing feeds back into the machine.

use serde::Serialize;

use super::PickTier;
use crate::types::{OrderId, OrderItemId, OrderStatus};

/// Output of every picking operation.
///
/// Serialized with a `type` tag:
///
/// ```json
/// { "type": "quantity_changed", "itemId": "i-1", "newQuantity": 3, "tier": "NEAR_COMPLETE" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PickEvent {
    /// An accepted add or confirmed remove.
    QuantityChanged {
        item_id: OrderItemId,
        new_quantity: u32,
        tier: PickTier,
    },
    /// The confirm-to-remove guard was armed or disarmed.
    RemoveArmed { item_id: OrderItemId, armed: bool },
    /// The order moved forward in its lifecycle.
    StatusChanged {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// A request was rejected as a no-op.
    GuardViolation {
        item_id: Option<OrderItemId>,
        violation: GuardViolation,
    },
}

impl PickEvent {
    /// Whether this event reports a rejected request.
    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::GuardViolation { .. })
    }
}

/// Why a picking request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GuardViolation {
    #[error("item is already at its target quantity")]
    AtTarget,
    #[error("item has nothing picked to remove")]
    AtZero,
    #[error("order has no such item")]
    UnknownItem,
    #[error("items cannot be picked while the order is {status}")]
    OrderNotPickable { status: OrderStatus },
    #[error("not every item is picked")]
    IncompleteItems,
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
