//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Health check
//!
//! # Orders
//! GET  /orders?status=A,B                        - Normalized order listing
//! POST /orders                                   - Submit an order (validated)
//! GET  /orders/stats                             - Counts by status
//! GET  /orders/queue                             - Pick queue, most urgent first
//! GET  /orders/{id}                              - Normalized order
//! PUT  /orders/{id}                              - Replace an order (validated)
//! PUT  /orders/{id}/status                       - Advance the lifecycle
//!
//! # Picking
//! POST   /orders/{id}/picking                    - Claim; returns a session token
//! GET    /orders/{id}/picking/{token}            - Session progress
//! DELETE /orders/{id}/picking/{token}            - Release and persist picks
//! GET    /orders/{id}/picking/{token}/events     - Server-sent session events
//! POST   /orders/{id}/picking/{token}/items/{item}/add    - Pick one unit
//! POST   /orders/{id}/picking/{token}/items/{item}/remove - Arm or confirm removal
//! ```

use axum::Router;

use crate::state::AppState;

pub mod orders;
pub mod picking;

/// Build the API router. `/health` is mounted by the binary.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(orders::router())
        .merge(picking::router())
}
