//! Picking session routes.
//!
//! A picker claims an order and receives a session token. Every later call
//! names the order and the token; a token from a released session is
//! rejected with `PICK_001`.

use std::convert::Infallible;

use arrowhead_core::normalize::is_valid_order_item;
use arrowhead_core::{NormalizedOrder, OrderId, OrderItemId, PickEvent, UserId};
use async_stream::stream;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::orders::load_order;
use crate::error::AppError;
use crate::services::PickSnapshot;
use crate::state::AppState;

/// Build the picking router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/picking", post(claim))
        .route(
            "/orders/{id}/picking/{token}",
            get(snapshot).delete(release),
        )
        .route("/orders/{id}/picking/{token}/events", get(events))
        .route(
            "/orders/{id}/picking/{token}/items/{item_id}/add",
            post(add_unit),
        )
        .route(
            "/orders/{id}/picking/{token}/items/{item_id}/remove",
            post(remove_unit),
        )
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub picker_id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub token: Uuid,
    pub order: NormalizedOrder,
    pub progress: PickSnapshot,
    /// Items a picker cannot work from the record alone: no SKU, no
    /// quantity, or no known bin location.
    pub unpickable_items: Vec<OrderItemId>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub events: Vec<PickEvent>,
    pub progress: PickSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub order: NormalizedOrder,
    pub progress: PickSnapshot,
}

// =============================================================================
// Handlers
// =============================================================================

/// Claim an order for picking.
///
/// POST /orders/{id}/picking
async fn claim(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), AppError> {
    let id = OrderId::new(id);
    let order = load_order(&state, &id)?;

    let session = state.picking().claim(&order, request.picker_id).await?;
    if let Err(e) = state.store().assign_picker(&id, session.picker_id()) {
        // Undo the claim so the order is not left locked
        if let Err(undo) = state.picking().abandon(&id, session.token()).await {
            tracing::warn!(order_id = %id, error = %undo, "Failed to undo picking claim");
        }
        return Err(e.into());
    }

    let unpickable_items: Vec<OrderItemId> = order
        .items
        .iter()
        .filter(|item| !is_valid_order_item(item))
        .filter_map(|item| item.id.clone())
        .collect();
    if !unpickable_items.is_empty() {
        tracing::warn!(
            order_id = %id,
            items = ?unpickable_items,
            "Claimed order has items that cannot be located"
        );
    }

    let progress = session.snapshot().await;
    Ok((
        StatusCode::CREATED,
        Json(ClaimResponse {
            token: session.token(),
            order,
            progress,
            unpickable_items,
        }),
    ))
}

/// Current progress of a session.
///
/// GET /orders/{id}/picking/{token}
async fn snapshot(
    State(state): State<AppState>,
    Path((id, token)): Path<(String, Uuid)>,
) -> Result<Json<PickSnapshot>, AppError> {
    let session = state.picking().session(&OrderId::new(id), token).await?;
    Ok(Json(session.snapshot().await))
}

/// Pick one more unit.
///
/// POST /orders/{id}/picking/{token}/items/{item_id}/add
async fn add_unit(
    State(state): State<AppState>,
    Path((id, token, item_id)): Path<(String, Uuid, String)>,
) -> Result<Json<ActionResponse>, AppError> {
    let session = state.picking().session(&OrderId::new(id), token).await?;
    let events = session.add(&OrderItemId::new(item_id)).await;
    let progress = session.snapshot().await;
    Ok(Json(ActionResponse { events, progress }))
}

/// Request, or confirm, removal of one unit.
///
/// POST /orders/{id}/picking/{token}/items/{item_id}/remove
async fn remove_unit(
    State(state): State<AppState>,
    Path((id, token, item_id)): Path<(String, Uuid, String)>,
) -> Result<Json<ActionResponse>, AppError> {
    let session = state.picking().session(&OrderId::new(id), token).await?;
    let events = session.remove(&OrderItemId::new(item_id)).await;
    let progress = session.snapshot().await;
    Ok(Json(ActionResponse { events, progress }))
}

/// Live session events as server-sent events.
///
/// GET /orders/{id}/picking/{token}/events
///
/// The first event is a `snapshot`; every later event is one `PickEvent`.
/// The stream ends when the session is released.
async fn events(
    State(state): State<AppState>,
    Path((id, token)): Path<(String, Uuid)>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let order_id = OrderId::new(id);
    let session = state.picking().session(&order_id, token).await?;
    let mut receiver = session.subscribe();
    let initial = session.snapshot().await;
    drop(session);

    let sse_stream = stream! {
        yield Ok::<_, Infallible>(Event::default().event("snapshot").data(to_json(&initial)));
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    yield Ok(Event::default().data(to_json(&event)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(order_id = %order_id, skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| {
        r#"{"type":"error","message":"Failed to serialize event"}"#.to_string()
    })
}

/// Release a session and persist its picks.
///
/// DELETE /orders/{id}/picking/{token}
///
/// If the picks cannot be stored the session stays open and the call can be
/// retried with the same token.
async fn release(
    State(state): State<AppState>,
    Path((id, token)): Path<(String, Uuid)>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let id = OrderId::new(id);
    let progress = state.picking().release(&id, token).await?;
    let order = load_order(&state, &id)?;
    Ok(Json(ReleaseResponse { order, progress }))
}
