//! Dashboard counts and pick queue for a dump.

use std::path::Path;

use arrowhead_core::NormalizedOrder;
use arrowhead_core::normalize::{format_estimated_time, normalize_orders};
use arrowhead_core::summary::{OrderStats, pick_queue};
use serde::Serialize;

use super::{CliError, emit, read_records};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueLine {
    pub id: Option<String>,
    pub customer_name: String,
    pub priority: String,
    pub items: u32,
    pub estimated_time: String,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub stats: OrderStats,
    pub queue: Vec<QueueLine>,
}

/// Summarize normalized orders.
#[must_use]
pub fn summarize(orders: &[NormalizedOrder]) -> StatsReport {
    let queue = pick_queue(orders)
        .into_iter()
        .map(|order| QueueLine {
            id: order.id.as_ref().map(ToString::to_string),
            customer_name: order.customer_name.clone(),
            priority: order.priority.to_string(),
            items: order.total_items,
            estimated_time: format_estimated_time(order.estimated_pick_minutes),
        })
        .collect();

    StatsReport {
        stats: OrderStats::from_orders(orders),
        queue,
    }
}

/// Run `stats` on a file.
pub fn run(path: &Path) -> Result<(), CliError> {
    let batch = normalize_orders(&read_records(path)?);
    if !batch.omitted.is_empty() {
        tracing::warn!(omitted = batch.omitted.len(), "Some records were not counted");
    }
    emit(&summarize(&batch.orders))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_summarize_orders_queue_by_priority() {
        let batch = normalize_orders(&[
            json!({ "id": "ORD-1", "customerName": "Low", "priority": "LOW", "estimatedPickMinutes": 75,
                    "items": [{ "id": "a", "quantity": 1 }] }),
            json!({ "id": "ORD-2", "customerName": "Urgent", "priority": "URGENT",
                    "items": [{ "id": "b", "quantity": 2 }] }),
            json!({ "id": "ORD-3", "status": "SHIPPED", "items": [{ "id": "c", "quantity": 1 }] }),
        ]);
        let report = summarize(&batch.orders);

        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.shipped, 1);
        assert_eq!(report.queue.len(), 2);
        assert_eq!(report.queue[0].id.as_deref(), Some("ORD-2"));
        assert_eq!(report.queue[1].estimated_time, "1:15");
    }
}
