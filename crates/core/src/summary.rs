//! Dashboard summaries over normalized orders.

use std::cmp::Reverse;

use serde::Serialize;

use crate::order::NormalizedOrder;
use crate::types::{OrderStatus, Priority};

/// Order counts for the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub picking: usize,
    pub ready_to_pack: usize,
    pub packed: usize,
    pub shipped: usize,
    pub cancelled: usize,
    /// Urgent orders that are neither shipped nor cancelled.
    pub urgent_open: usize,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a NormalizedOrder>) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total += 1;
            match order.status {
                Some(OrderStatus::Pending) => stats.pending += 1,
                Some(OrderStatus::Picking) => stats.picking += 1,
                Some(OrderStatus::ReadyToPack) => stats.ready_to_pack += 1,
                Some(OrderStatus::Packed) => stats.packed += 1,
                Some(OrderStatus::Shipped) => stats.shipped += 1,
                Some(OrderStatus::Cancelled) => stats.cancelled += 1,
                None => {}
            }
            let open = order.status.is_some_and(|status| !status.is_terminal());
            if open && order.priority == Priority::Urgent {
                stats.urgent_open += 1;
            }
            stats
        })
    }

    /// Count for one status.
    #[must_use]
    pub const fn count(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Picking => self.picking,
            OrderStatus::ReadyToPack => self.ready_to_pack,
            OrderStatus::Packed => self.packed,
            OrderStatus::Shipped => self.shipped,
            OrderStatus::Cancelled => self.cancelled,
        }
    }
}

/// Orders waiting on a picker: `PENDING` or `PICKING`, most urgent first.
///
/// Within a priority, older orders come first and orders without a
/// creation time go last. The sort is stable, so ties keep input order.
#[must_use]
pub fn pick_queue(orders: &[NormalizedOrder]) -> Vec<&NormalizedOrder> {
    let mut queue: Vec<&NormalizedOrder> = orders
        .iter()
        .filter(|order| {
            matches!(
                order.status,
                Some(OrderStatus::Pending | OrderStatus::Picking)
            )
        })
        .collect();
    queue.sort_by_key(|order| {
        (
            Reverse(order.priority),
            order.created_at.is_none(),
            order.created_at,
        )
    });
    queue
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::normalize_orders;
    use crate::types::OrderId;

    fn orders() -> Vec<NormalizedOrder> {
        let item = json!([{ "id": "i", "sku": "123456789012", "quantity": 1, "location": "A" }]);
        let raw = vec![
            json!({ "id": "n-old", "status": "PENDING", "createdAt": "2025-01-01T08:00:00Z", "items": item }),
            json!({ "id": "u-new", "status": "PICKING", "priority": "urgent", "createdAt": "2025-01-02T08:00:00Z", "items": item }),
            json!({ "id": "n-undated", "status": "PENDING", "items": item }),
            json!({ "id": "o", "status": "PENDING", "priority": "OVERNIGHT", "createdAt": "2025-01-03T08:00:00Z", "items": item }),
            json!({ "id": "u-old", "status": "PENDING", "priority": "URGENT", "createdAt": "2025-01-01T07:00:00Z", "items": item }),
            json!({ "id": "n-new", "status": "PENDING", "createdAt": "2025-01-04T08:00:00Z", "items": item }),
            json!({ "id": "low", "status": "PENDING", "priority": "LOW", "createdAt": "2024-12-01T08:00:00Z", "items": item }),
            json!({ "id": "shipped", "status": "SHIPPED", "priority": "URGENT", "items": item }),
            json!({ "id": "packed", "status": "PACKED", "items": item }),
        ];
        normalize_orders(&raw).orders
    }

    #[test]
    fn test_stats_counts() {
        let orders = orders();
        let stats = OrderStats::from_orders(&orders);
        assert_eq!(stats.total, 9);
        assert_eq!(stats.pending, 6);
        assert_eq!(stats.picking, 1);
        assert_eq!(stats.packed, 1);
        assert_eq!(stats.shipped, 1);
        assert_eq!(stats.count(OrderStatus::Cancelled), 0);
        assert_eq!(stats.urgent_open, 2);
    }

    #[test]
    fn test_stats_json_shape() {
        let json = serde_json::to_value(OrderStats::default()).unwrap();
        assert_eq!(json["readyToPack"], 0);
        assert_eq!(json["urgentOpen"], 0);
    }

    #[test]
    fn test_pick_queue_order() {
        let orders = orders();
        let ids: Vec<&str> = pick_queue(&orders)
            .iter()
            .filter_map(|order| order.id.as_ref().map(OrderId::as_str))
            .collect();
        assert_eq!(
            ids,
            vec!["u-old", "u-new", "o", "n-old", "n-new", "n-undated", "low"]
        );
    }
}
