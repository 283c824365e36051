//! Per-order picking controller and lifecycle guard.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::{GuardViolation, ItemPicker, PickEvent, PickTier};
use crate::order::NormalizedOrder;
use crate::types::{OrderId, OrderItemId, OrderStatus};

/// Why an order cannot be opened for picking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickListError {
    #[error("order has no id")]
    MissingOrderId,
    #[error("order status is unknown")]
    UnknownStatus,
    #[error("item at position {position} has no id")]
    ItemWithoutId { position: usize },
    #[error("order has no items")]
    NoItems,
}

/// Lifecycle guard for moving an order from `from` to `to`.
///
/// The step must be allowed by [`OrderStatus::can_advance_to`], and
/// `READY_TO_PACK`, `PACKED` and `SHIPPED` need every item complete.
///
/// # Errors
///
/// Returns the violated guard.
pub const fn check_transition(
    from: OrderStatus,
    to: OrderStatus,
    all_items_complete: bool,
) -> Result<(), GuardViolation> {
    if !from.can_advance_to(to) {
        return Err(GuardViolation::InvalidTransition { from, to });
    }
    let needs_complete = matches!(
        to,
        OrderStatus::ReadyToPack | OrderStatus::Packed | OrderStatus::Shipped
    );
    if needs_complete && !all_items_complete {
        return Err(GuardViolation::IncompleteItems);
    }
    Ok(())
}

/// Progress snapshot for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProgress {
    pub item_id: OrderItemId,
    pub picked_quantity: u32,
    pub quantity: u32,
    pub tier: PickTier,
    pub armed: bool,
}

/// Drives every item of one order and the order's status.
///
/// Automatic transitions only move forward: `PENDING -> PICKING` on the
/// first add, `PICKING -> READY_TO_PACK` once every item is complete.
/// Items can be changed only while the order is `PENDING` or `PICKING`.
#[derive(Debug, Clone)]
pub struct PickList {
    order_id: OrderId,
    status: OrderStatus,
    items: Vec<ItemPicker>,
}

impl PickList {
    /// Open a normalized order for picking.
    ///
    /// # Errors
    ///
    /// Returns [`PickListError`] when the order lacks an id, a known status,
    /// items, or item ids.
    pub fn from_order(order: &NormalizedOrder, window: Duration) -> Result<Self, PickListError> {
        let order_id = order.id.clone().ok_or(PickListError::MissingOrderId)?;
        let status = order.status.ok_or(PickListError::UnknownStatus)?;
        if order.items.is_empty() {
            return Err(PickListError::NoItems);
        }

        let items = order
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let id = item
                    .id
                    .clone()
                    .ok_or(PickListError::ItemWithoutId { position })?;
                Ok(ItemPicker::new(id, item.picked_quantity, item.quantity, window))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            order_id,
            status,
            items,
        })
    }

    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    #[must_use]
    pub fn items(&self) -> &[ItemPicker] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, item_id: &OrderItemId) -> Option<&ItemPicker> {
        self.items.iter().find(|item| item.item_id() == item_id)
    }

    /// The entry guard for packing and shipping.
    #[must_use]
    pub fn all_items_complete(&self) -> bool {
        self.items.iter().all(ItemPicker::is_complete)
    }

    #[must_use]
    pub fn progress(&self) -> Vec<ItemProgress> {
        self.items
            .iter()
            .map(|item| ItemProgress {
                item_id: item.item_id().clone(),
                picked_quantity: item.current(),
                quantity: item.target(),
                tier: item.tier(),
                armed: item.is_armed(),
            })
            .collect()
    }

    pub fn add(&mut self, item_id: &OrderItemId, now: Instant) -> Vec<PickEvent> {
        let mut events = match self.pickable_item(item_id) {
            Ok(item) => item.add(now),
            Err(violation) => return vec![violation],
        };

        let picked = events
            .iter()
            .any(|event| matches!(event, PickEvent::QuantityChanged { .. }));
        if picked && self.status == OrderStatus::Pending {
            events.push(self.transition(OrderStatus::Picking));
        }
        if picked && self.status == OrderStatus::Picking && self.all_items_complete() {
            events.extend(self.disarm_all());
            events.push(self.transition(OrderStatus::ReadyToPack));
        }
        events
    }

    pub fn remove(&mut self, item_id: &OrderItemId, now: Instant) -> Vec<PickEvent> {
        match self.pickable_item(item_id) {
            Ok(item) => item.remove(now),
            Err(violation) => vec![violation],
        }
    }

    /// Deliver an item's expiry timer. Allowed in any status.
    pub fn expire(&mut self, item_id: &OrderItemId, now: Instant) -> Vec<PickEvent> {
        self.items
            .iter_mut()
            .find(|item| item.item_id() == item_id)
            .map_or_else(Vec::new, |item| item.expire(now))
    }

    pub fn disarm_all(&mut self) -> Vec<PickEvent> {
        self.items.iter_mut().flat_map(ItemPicker::disarm).collect()
    }

    /// Explicit lifecycle step requested by a collaborator (packing,
    /// shipping, cancellation).
    ///
    /// `READY_TO_PACK`, `PACKED` and `SHIPPED` all require every item to be
    /// complete. Backward moves are always rejected.
    pub fn advance(&mut self, to: OrderStatus) -> Vec<PickEvent> {
        if let Err(violation) = check_transition(self.status, to, self.all_items_complete()) {
            return vec![self.order_violation(violation)];
        }

        let mut events = self.disarm_all();
        events.push(self.transition(to));
        events
    }

    fn pickable_item(&mut self, item_id: &OrderItemId) -> Result<&mut ItemPicker, PickEvent> {
        let status = self.status;
        if !matches!(status, OrderStatus::Pending | OrderStatus::Picking) {
            return Err(PickEvent::GuardViolation {
                item_id: Some(item_id.clone()),
                violation: GuardViolation::OrderNotPickable { status },
            });
        }
        self.items
            .iter_mut()
            .find(|item| item.item_id() == item_id)
            .ok_or_else(|| PickEvent::GuardViolation {
                item_id: Some(item_id.clone()),
                violation: GuardViolation::UnknownItem,
            })
    }

    fn transition(&mut self, to: OrderStatus) -> PickEvent {
        let from = self.status;
        self.status = to;
        tracing::info!(order_id = %self.order_id, %from, %to, "Order status changed");
        PickEvent::StatusChanged {
            order_id: self.order_id.clone(),
            from,
            to,
        }
    }

    fn order_violation(&self, violation: GuardViolation) -> PickEvent {
        tracing::warn!(order_id = %self.order_id, %violation, "Rejected status change");
        PickEvent::GuardViolation {
            item_id: None,
            violation,
        }
    }
}
