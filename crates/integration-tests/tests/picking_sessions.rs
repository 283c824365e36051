//! Integration tests for live picking sessions.
//!
//! Time-sensitive tests run on a paused tokio clock, so the two-second
//! confirm window elapses instantly and deterministically.

use std::time::Duration;

use arrowhead_integration_tests::{TestApp, order_payload};
use arrowhead_server::config::ServerConfig;
use axum::body::BodyDataStream;
use axum::http::{Method, StatusCode};
use futures::StreamExt;
use serde_json::{Value, json};

fn item<'a>(body: &'a Value, id: &str) -> &'a Value {
    body["progress"]["items"]
        .as_array()
        .and_then(|items| items.iter().find(|item| item["itemId"] == id))
        .unwrap_or(&Value::Null)
}

async fn session(app: &TestApp) -> (String, String) {
    let id = app.create_order(order_payload()).await;
    let token = app.claim(&id, "picker-1").await;
    (id, token)
}

// =============================================================================
// Claiming
// =============================================================================

#[tokio::test]
async fn test_claim_returns_token_and_progress() {
    let app = TestApp::new();
    let id = app.create_order(order_payload()).await;

    let (status, body) = app
        .post(&format!("/orders/{id}/picking"), json!({ "pickerId": "picker-1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].is_string());
    assert_eq!(body["order"]["id"], id.as_str());
    assert_eq!(body["progress"]["pickerId"], "picker-1");
    assert_eq!(item(&body, "item-a")["tier"], "NOT_STARTED");

    let (_, order) = app.get(&format!("/orders/{id}")).await;
    assert_eq!(order["assignedPickerId"], "picker-1");
}

#[tokio::test]
async fn test_claim_flags_items_without_a_bin() {
    let app = TestApp::new();
    let mut payload = order_payload();
    payload["items"][1]["binLocation"] = json!("UNKNOWN");
    let id = app.create_order(payload).await;

    let (status, body) = app
        .post(&format!("/orders/{id}/picking"), json!({ "pickerId": "picker-1" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["unpickableItems"], json!(["item-b"]));

    let id = app.create_order(order_payload()).await;
    let (_, body) = app
        .post(&format!("/orders/{id}/picking"), json!({ "pickerId": "picker-1" }))
        .await;
    assert_eq!(body["unpickableItems"], json!([]));
}

#[tokio::test]
async fn test_second_claim_conflicts() {
    let app = TestApp::new();
    let (id, _token) = session(&app).await;

    let (status, body) = app
        .post(&format!("/orders/{id}/picking"), json!({ "pickerId": "picker-2" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PICK_005");
}

#[tokio::test]
async fn test_claim_unknown_order() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/orders/ORD-404/picking", json!({ "pickerId": "picker-1" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORD_001");
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let app = TestApp::new();
    let (id, _token) = session(&app).await;

    let other = uuid::Uuid::new_v4();
    let (status, body) = app
        .post(&format!("/orders/{id}/picking/{other}/items/item-a/add"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PICK_001");
}

// =============================================================================
// Quantity Controls
// =============================================================================

#[tokio::test]
async fn test_add_stops_at_target() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;
    let add = format!("/orders/{id}/picking/{token}/items/item-a/add");

    let mut last = Value::Null;
    for _ in 0..6 {
        let (status, body) = app.post(&add, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }

    assert_eq!(item(&last, "item-a")["pickedQuantity"], 5);
    assert_eq!(item(&last, "item-a")["tier"], "COMPLETE");
    assert_eq!(last["events"][0]["type"], "guard_violation");
    assert_eq!(last["events"][0]["violation"]["kind"], "at_target");
}

#[tokio::test]
async fn test_first_pick_moves_order_to_picking() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;

    let (_, body) = app
        .post(&format!("/orders/{id}/picking/{token}/items/item-b/add"), json!({}))
        .await;
    let events = body["events"].as_array().cloned().unwrap_or_default();
    assert!(events.iter().any(|event| {
        event["type"] == "status_changed" && event["from"] == "PENDING" && event["to"] == "PICKING"
    }));
    assert_eq!(body["progress"]["status"], "PICKING");
    assert_eq!(item(&body, "item-b")["tier"], "STARTED");
}

#[tokio::test]
async fn test_unknown_item_is_a_violation() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;

    let (status, body) = app
        .post(&format!("/orders/{id}/picking/{token}/items/nope/add"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["violation"]["kind"], "unknown_item");
}

#[tokio::test(start_paused = true)]
async fn test_remove_needs_confirmation_within_window() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;
    let add = format!("/orders/{id}/picking/{token}/items/item-b/add");
    let remove = format!("/orders/{id}/picking/{token}/items/item-b/remove");
    app.post(&add, json!({})).await;
    app.post(&add, json!({})).await;

    let (_, body) = app.post(&remove, json!({})).await;
    assert_eq!(item(&body, "item-b")["pickedQuantity"], 2);
    assert_eq!(item(&body, "item-b")["armed"], true);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let (_, body) = app.post(&remove, json!({})).await;
    assert_eq!(item(&body, "item-b")["pickedQuantity"], 1);
    assert_eq!(item(&body, "item-b")["armed"], false);
}

#[tokio::test(start_paused = true)]
async fn test_unconfirmed_remove_disarms_after_window() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;
    let add = format!("/orders/{id}/picking/{token}/items/item-b/add");
    let remove = format!("/orders/{id}/picking/{token}/items/item-b/remove");
    app.post(&add, json!({})).await;
    app.post(&add, json!({})).await;
    app.post(&remove, json!({})).await;

    tokio::time::sleep(Duration::from_millis(2001)).await;
    let (status, body) = app.get(&format!("/orders/{id}/picking/{token}")).await;
    assert_eq!(status, StatusCode::OK);
    let progress = json!({ "progress": body });
    assert_eq!(item(&progress, "item-b")["pickedQuantity"], 2);
    assert_eq!(item(&progress, "item-b")["armed"], false);

    // The next remove arms again instead of confirming
    let (_, body) = app.post(&remove, json!({})).await;
    assert_eq!(item(&body, "item-b")["pickedQuantity"], 2);
    assert_eq!(item(&body, "item-b")["armed"], true);
}

#[tokio::test]
async fn test_remove_at_zero_is_a_violation() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;

    let (_, body) = app
        .post(&format!("/orders/{id}/picking/{token}/items/item-a/remove"), json!({}))
        .await;
    assert_eq!(body["events"][0]["violation"]["kind"], "at_zero");
    assert_eq!(item(&body, "item-a")["armed"], false);
}

// =============================================================================
// Completion And Release
// =============================================================================

#[tokio::test]
async fn test_completing_every_item_readies_order() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;

    let mut last = Value::Null;
    for (item_id, quantity) in [("item-a", 5), ("item-b", 4)] {
        for _ in 0..quantity {
            last = app
                .post(
                    &format!("/orders/{id}/picking/{token}/items/{item_id}/add"),
                    json!({}),
                )
                .await
                .1;
        }
    }
    assert_eq!(last["progress"]["status"], "READY_TO_PACK");
    assert_eq!(last["progress"]["allItemsComplete"], true);

    let (status, body) = app.delete(&format!("/orders/{id}/picking/{token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "READY_TO_PACK");
    assert_eq!(body["order"]["items"][0]["pickedQuantity"], 5);
    assert_eq!(body["order"]["items"][1]["pickedQuantity"], 4);

    // Status routes unlock after release
    let (status, _) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "PACKED" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_release_persists_partial_progress() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;
    app.post(&format!("/orders/{id}/picking/{token}/items/item-a/add"), json!({}))
        .await;

    let (status, _) = app.delete(&format!("/orders/{id}/picking/{token}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = app.get(&format!("/orders/{id}")).await;
    assert_eq!(order["status"], "PICKING");
    assert_eq!(order["items"][0]["pickedQuantity"], 1);

    // The token is spent
    let (status, body) = app.delete(&format!("/orders/{id}/picking/{token}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PICK_001");

    // A new claim resumes from the persisted count
    let token = app.claim(&id, "picker-2").await;
    let (_, body) = app.get(&format!("/orders/{id}/picking/{token}")).await;
    let progress = json!({ "progress": body });
    assert_eq!(item(&progress, "item-a")["pickedQuantity"], 1);
}

// =============================================================================
// Idle Sessions
// =============================================================================

fn idle_timeout() -> Duration {
    ServerConfig::default().session_idle_timeout
}

#[tokio::test(start_paused = true)]
async fn test_idle_session_releases_with_picks() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;
    app.post(&format!("/orders/{id}/picking/{token}/items/item-a/add"), json!({}))
        .await;

    tokio::time::sleep(idle_timeout() + Duration::from_secs(1)).await;

    let (status, body) = app
        .post(&format!("/orders/{id}/picking/{token}/items/item-a/add"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PICK_001");

    let (_, order) = app.get(&format!("/orders/{id}")).await;
    assert_eq!(order["status"], "PICKING");
    assert_eq!(order["items"][0]["pickedQuantity"], 1);

    let (status, _) = app
        .post(&format!("/orders/{id}/picking"), json!({ "pickerId": "picker-2" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test(start_paused = true)]
async fn test_idle_session_unlocks_status_changes() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;

    let half = idle_timeout() / 2;
    tokio::time::sleep(half).await;
    app.post(&format!("/orders/{id}/picking/{token}/items/item-a/add"), json!({}))
        .await;
    tokio::time::sleep(half + Duration::from_secs(1)).await;

    // The add restarted the idle clock
    let (status, body) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "CANCELLED" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PICK_005");

    tokio::time::sleep(half).await;
    let (status, body) = app
        .put(&format!("/orders/{id}/status"), json!({ "status": "CANCELLED" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "CANCELLED");
}

// =============================================================================
// Event Stream
// =============================================================================

#[tokio::test]
async fn test_event_stream_follows_session() {
    let app = TestApp::new();
    let (id, token) = session(&app).await;

    let response = app
        .send(Method::GET, &format!("/orders/{id}/picking/{token}/events"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"))
    );
    let mut frames = response.into_body().into_data_stream();

    let first = next_frame(&mut frames).await.unwrap_or_default();
    assert!(first.contains("event: snapshot"), "{first}");

    app.post(&format!("/orders/{id}/picking/{token}/items/item-a/add"), json!({}))
        .await;
    let mut seen = String::new();
    while !(seen.contains("quantity_changed") && seen.contains("status_changed")) {
        match next_frame(&mut frames).await {
            Some(frame) => seen.push_str(&frame),
            None => break,
        }
    }
    assert!(seen.contains("status_changed"), "{seen}");
    assert!(seen.contains("quantity_changed"), "{seen}");

    app.delete(&format!("/orders/{id}/picking/{token}")).await;
    assert_eq!(next_frame(&mut frames).await, None);
}

/// Next SSE frame as text; `None` once the stream has ended.
async fn next_frame(frames: &mut BodyDataStream) -> Option<String> {
    let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("event stream stalled")?;
    frame
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
