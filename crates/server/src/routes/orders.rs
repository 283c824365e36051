//! Order submission and read routes.

use arrowhead_core::normalize::{
    format_estimated_time, normalize_order, normalize_orders, normalize_record,
};
use arrowhead_core::picking::{PickEvent, check_transition};
use arrowhead_core::summary::{OrderStats, pick_queue};
use arrowhead_core::validation::accept_order;
use arrowhead_core::{
    NormalizedOrder, Omission, OrderId, OrderItem, OrderItemId, OrderStatus, PickList,
    ValidationRejection,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::middleware::{ValidatedOrder, ValidatedStatus};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/stats", get(order_stats))
        .route("/orders/queue", get(order_queue))
        .route("/orders/{id}", get(get_order).put(update_order))
        .route("/orders/{id}/status", put(update_status))
}

// =============================================================================
// Reads
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated statuses, case-insensitive.
    status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListing {
    pub orders: Vec<NormalizedOrder>,
    pub total: usize,
    /// Stored records that could not be shown.
    pub omitted: Vec<Omission>,
}

/// List normalized orders.
///
/// GET /orders?status=PENDING,PICKING
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderListing>, AppError> {
    let wanted = query.status.as_deref().map(parse_status_filter).transpose()?;

    let batch = normalize_orders(&state.store().list()?);
    let orders: Vec<NormalizedOrder> = batch
        .orders
        .into_iter()
        .filter(|order| {
            wanted.as_ref().is_none_or(|statuses| {
                order.status.is_some_and(|status| statuses.contains(&status))
            })
        })
        .collect();

    Ok(Json(OrderListing {
        total: orders.len(),
        orders,
        omitted: batch.omitted,
    }))
}

fn parse_status_filter(raw: &str) -> Result<Vec<OrderStatus>, AppError> {
    let mut statuses = Vec::new();
    let mut errors = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        match token.parse::<OrderStatus>() {
            Ok(status) => statuses.push(status),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(statuses)
    } else {
        Err(AppError::Validation(ValidationRejection {
            message: "Invalid status filter".to_string(),
            errors,
        }))
    }
}

/// Dashboard counts.
///
/// GET /orders/stats
async fn order_stats(State(state): State<AppState>) -> Result<Json<OrderStats>, AppError> {
    let batch = normalize_orders(&state.store().list()?);
    Ok(Json(OrderStats::from_orders(&batch.orders)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueEntry<'a> {
    #[serde(flatten)]
    order: &'a NormalizedOrder,
    estimated_time: String,
    total_picked: u32,
}

/// Orders awaiting a picker, most urgent first.
///
/// GET /orders/queue
async fn order_queue(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let batch = normalize_orders(&state.store().list()?);
    let entries: Vec<QueueEntry<'_>> = pick_queue(&batch.orders)
        .into_iter()
        .map(|order| QueueEntry {
            order,
            estimated_time: format_estimated_time(order.estimated_pick_minutes),
            total_picked: order.total_picked(),
        })
        .collect();
    let body = serde_json::to_value(entries).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(body))
}

/// A single normalized order.
///
/// GET /orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NormalizedOrder>, AppError> {
    let id = OrderId::new(id);
    Ok(Json(load_order(&state, &id)?))
}

/// Read and normalize one stored order. Malformed records read as missing.
pub(crate) fn load_order(state: &AppState, id: &OrderId) -> Result<NormalizedOrder, AppError> {
    let raw = state
        .store()
        .get(id)?
        .ok_or_else(|| AppError::OrderNotFound(id.clone()))?;
    normalize_record(&raw).map_err(|reason| {
        tracing::warn!(order_id = %id, %reason, "Stored order is malformed");
        AppError::OrderNotFound(id.clone())
    })
}

// =============================================================================
// Writes
// =============================================================================

/// Create an order from a validated payload.
///
/// POST /orders
async fn create_order(
    State(state): State<AppState>,
    ValidatedOrder(payload): ValidatedOrder,
) -> Result<(StatusCode, Json<NormalizedOrder>), AppError> {
    let stored = state.store().create(payload)?;
    let order = normalize_record(&stored)
        .map_err(|reason| AppError::Internal(format!("created order is malformed: {reason}")))?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Replace an order.
///
/// PUT /orders/{id}
///
/// A payload without `status` keeps the stored one. A different status
/// passes the same lifecycle guard as a status update, judged on the
/// replacement items. Picked and packed quantities always come from the
/// stored order; items new to the order start unpicked.
async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<Value>,
) -> Result<Json<NormalizedOrder>, AppError> {
    let id = OrderId::new(id);
    if state.picking().is_active(&id).await {
        return Err(AppError::OrderLocked(id));
    }
    let current = load_order(&state, &id)?;

    if let (Some(fields), Some(status)) = (payload.as_object_mut(), current.status)
        && fields.get("status").is_none_or(Value::is_null)
    {
        fields.insert("status".to_string(), Value::from(status.as_str()));
    }
    let mut payload = accept_order(payload)?;
    carry_pick_progress(&mut payload, &current);

    let replacement = normalize_order(Some(&payload))
        .map_err(|reason| AppError::Internal(format!("accepted order is malformed: {reason}")))?;
    if let (Some(from), Some(to)) = (current.status, replacement.status)
        && from != to
    {
        let complete = replacement.items.iter().all(OrderItem::is_picked);
        check_transition(from, to, complete).map_err(AppError::InvalidTransition)?;
    }

    let stored = state.store().replace(&id, payload)?;
    let order = normalize_record(&stored)
        .map_err(|reason| AppError::Internal(format!("updated order is malformed: {reason}")))?;
    Ok(Json(order))
}

/// Overwrite the pick counts in a replacement payload with the stored ones,
/// matched by item id and capped at the new quantity.
fn carry_pick_progress(payload: &mut Value, current: &NormalizedOrder) {
    let Some(items) = payload.get_mut("items").and_then(Value::as_array_mut) else {
        return;
    };
    for fields in items.iter_mut().filter_map(Value::as_object_mut) {
        let quantity = fields
            .get("quantity")
            .and_then(Value::as_u64)
            .map_or(0, |quantity| u32::try_from(quantity).unwrap_or(u32::MAX));
        let stored = fields
            .get("id")
            .and_then(|id| match id {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .and_then(|id| current.item(&OrderItemId::new(id)));
        let (picked, packed) =
            stored.map_or((0, 0), |item| (item.picked_quantity, item.packed_quantity));
        fields.insert("pickedQuantity".to_string(), Value::from(picked.min(quantity)));
        fields.insert("packedQuantity".to_string(), Value::from(packed.min(quantity)));
    }
}

/// Move an order forward in its lifecycle.
///
/// PUT /orders/{id}/status
///
/// `READY_TO_PACK`, `PACKED` and `SHIPPED` require every item picked.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedStatus(to): ValidatedStatus,
) -> Result<Json<NormalizedOrder>, AppError> {
    let id = OrderId::new(id);
    if state.picking().is_active(&id).await {
        return Err(AppError::OrderLocked(id));
    }
    let order = load_order(&state, &id)?;

    let mut list = PickList::from_order(&order, state.config().remove_confirm_window)
        .map_err(|e| AppError::Session(e.into()))?;
    for event in list.advance(to) {
        if let PickEvent::GuardViolation { violation, .. } = event {
            return Err(AppError::InvalidTransition(violation));
        }
    }

    let stored = state.store().set_status(&id, to)?;
    tracing::info!(order_id = %id, status = %to, "Order status updated");
    let order = normalize_record(&stored)
        .map_err(|reason| AppError::Internal(format!("updated order is malformed: {reason}")))?;
    Ok(Json(order))
}
