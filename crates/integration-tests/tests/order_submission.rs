//! Integration tests for validated order writes.
//!
//! Every write goes through the validating extractors, so these tests cover
//! the full submission contract as a client sees it.

use arrowhead_integration_tests::{TestApp, order_payload};
use arrowhead_server::db::OrderStore;
use axum::http::{Method, StatusCode};
use serde_json::json;

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_applies_write_time_defaults() {
    let app = TestApp::new();
    let (status, body) = app.post("/orders", order_payload()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_str().is_some_and(|id| id.starts_with("ORD-")));
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["priority"], "URGENT");
    assert_eq!(body["estimatedPickMinutes"], 10);
    assert_eq!(body["totalItems"], 9);
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_rejects_empty_items() {
    let app = TestApp::new();
    let mut payload = order_payload();
    payload["items"] = json!([]);

    let (status, body) = app.post("/orders", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["code"], "VAL_001");
    let errors = body["errors"].as_array().cloned().unwrap_or_default();
    assert!(
        errors
            .iter()
            .any(|e| e.as_str().is_some_and(|e| e.contains("at least one item")))
    );
    assert!(app.store().list().is_ok_and(|records| records.is_empty()));
}

#[tokio::test]
async fn test_create_reports_item_position() {
    let app = TestApp::new();
    let mut payload = order_payload();
    payload["items"] = json!([{ "quantity": 1, "location": "A-01" }]);

    let (status, body) = app.post("/orders", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().cloned().unwrap_or_default();
    assert!(
        errors
            .iter()
            .any(|e| e.as_str().is_some_and(|e| e.starts_with("Item 1: ")))
    );
}

#[tokio::test]
async fn test_create_accumulates_every_error() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/orders",
            json!({ "customerEmail": "not-an-email", "priority": "SOMEDAY" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    // name, email, phone, priority, items
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_create_rejects_unreadable_body() {
    let app = TestApp::new();
    let response = app.send(Method::POST, "/orders", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_rejects_duplicate_id() {
    let app = TestApp::new();
    let mut payload = order_payload();
    payload["id"] = json!("ORD-FIXED");

    assert_eq!(app.post("/orders", payload.clone()).await.0, StatusCode::CREATED);
    let (status, body) = app.post("/orders", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DB_004");
}

// =============================================================================
// Replace
// =============================================================================

#[tokio::test]
async fn test_replace_keeps_stored_status() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;
    let (status, _) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "PICKING" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut payload = order_payload();
    payload["customerName"] = json!("Bruno Costa");
    let (status, body) = app.put(&format!("/orders/{id}"), payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["customerName"], "Bruno Costa");
    assert_eq!(body["status"], "PICKING");
}

#[tokio::test]
async fn test_replace_cannot_move_status_backwards() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;
    app.put(&format!("/orders/{id}/status"), json!({ "status": "PICKING" }))
        .await;

    let mut payload = order_payload();
    payload["status"] = json!("PENDING");
    let (status, body) = app.put(&format!("/orders/{id}"), payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORD_002");
}

#[tokio::test]
async fn test_replace_cannot_skip_picking() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;
    app.put(&format!("/orders/{id}/status"), json!({ "status": "PICKING" }))
        .await;

    // Client-sent pick counts do not satisfy the guard
    let mut payload = order_payload();
    payload["status"] = json!("READY_TO_PACK");
    payload["items"][0]["pickedQuantity"] = json!(5);
    payload["items"][1]["pickedQuantity"] = json!(4);
    let (status, body) = app.put(&format!("/orders/{id}"), payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORD_002");

    let mut payload = order_payload();
    payload["status"] = json!("PACKED");
    let (status, body) = app.put(&format!("/orders/{id}"), payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORD_002");

    let (_, order) = app.get(&format!("/orders/{id}")).await;
    assert_eq!(order["status"], "PICKING");
    assert_eq!(order["items"][0]["pickedQuantity"], 0);
}

#[tokio::test]
async fn test_replace_keeps_recorded_picks() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;
    let token = app.claim(&id, "picker-1").await;
    for _ in 0..3 {
        app.post(
            &format!("/orders/{id}/picking/{token}/items/item-a/add"),
            json!({}),
        )
        .await;
    }
    let (status, _) = app.delete(&format!("/orders/{id}/picking/{token}")).await;
    assert_eq!(status, StatusCode::OK);

    let mut payload = order_payload();
    payload["items"][1]["pickedQuantity"] = json!(4);
    if let Some(items) = payload["items"].as_array_mut() {
        items.push(json!({ "sku": "123456789012", "quantity": 1, "location": "C-03" }));
    }
    let (status, body) = app.put(&format!("/orders/{id}"), payload).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "PICKING");
    assert_eq!(body["items"][0]["pickedQuantity"], 3);
    assert_eq!(body["items"][1]["pickedQuantity"], 0);
    assert_eq!(body["items"][2]["pickedQuantity"], 0);
}

#[tokio::test]
async fn test_replace_advances_once_picked() {
    let app = TestApp::new();
    let mut payload = order_payload();
    payload["items"] = json!([
        { "id": "item-a", "sku": "123456789012", "quantity": 2, "pickedQuantity": 2, "location": "A-01" }
    ]);
    let id = app.create_order(payload.clone()).await;

    payload["status"] = json!("READY_TO_PACK");
    let (status, body) = app.put(&format!("/orders/{id}"), payload).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "READY_TO_PACK");
    assert_eq!(body["items"][0]["pickedQuantity"], 2);
}

#[tokio::test]
async fn test_replace_unknown_order() {
    let app = TestApp::new();
    let (status, body) = app.put("/orders/ORD-NOPE", order_payload()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORD_001");
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn test_status_update_requires_known_status() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;

    let (status, body) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "LOST" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VAL_001");

    let (status, _) = app.put(&format!("/orders/{id}/status"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_update_guards_incomplete_items() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;

    let (status, body) = app
        .put(
            &format!("/orders/{id}/status"),
            json!({ "status": "READY_TO_PACK" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORD_002");
}

#[tokio::test]
async fn test_status_update_walks_the_lifecycle() {
    let app = TestApp::new();
    let mut payload = order_payload();
    payload["items"] = json!([
        { "sku": "123456789012", "quantity": 2, "pickedQuantity": 2, "location": "A-01" }
    ]);
    let id = app.create_order(payload).await;

    for next in ["PICKING", "READY_TO_PACK", "PACKED", "SHIPPED"] {
        let (status, body) = app
            .put(&format!("/orders/{id}/status"), json!({ "status": next }))
            .await;
        assert_eq!(status, StatusCode::OK, "{next}: {body}");
        assert_eq!(body["status"], next);
    }

    let (_, body) = app.get(&format!("/orders/{id}")).await;
    assert!(body["packedAt"].is_string());
    assert!(body["shippedAt"].is_string());

    // Terminal
    let (status, _) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "CANCELLED" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_update_locked_while_picking() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;
    app.claim(&id, "picker-1").await;

    let (status, body) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "CANCELLED" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PICK_005");
}
