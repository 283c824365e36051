//! Integration tests for Arrowhead.
//!
//! The full server router is driven in-process with `tower::ServiceExt::oneshot`,
//! so no port is bound and no external services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p arrowhead-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_submission` - Validated create, replace, and status routes
//! - `order_reads` - Normalized listing, stats, and queue over messy records
//! - `picking_sessions` - Claim, pick, confirm-to-remove, events, release

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use arrowhead_server::config::ServerConfig;
use arrowhead_server::db::{InMemoryOrderStore, OrderStore};
use arrowhead_server::state::AppState;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

/// A server router over its own in-memory store.
pub struct TestApp {
    router: Router,
    store: Arc<InMemoryOrderStore>,
}

impl TestApp {
    /// Empty store, default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Store seeded with raw records, kept verbatim.
    #[must_use]
    pub fn with_records(records: Vec<Value>) -> Self {
        let store = Arc::new(InMemoryOrderStore::with_records(records));
        let shared: Arc<dyn OrderStore> = store.clone();
        let router = arrowhead_server::app(AppState::new(ServerConfig::default(), shared));
        Self { router, store }
    }

    #[must_use]
    pub fn store(&self) -> &InMemoryOrderStore {
        &self.store
    }

    /// Send a request and return the raw response.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Send a request and read the JSON body. Non-JSON bodies read as `null`.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.send(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None).await
    }

    /// Create an order and return its id.
    pub async fn create_order(&self, payload: Value) -> String {
        let (status, body) = self.post("/orders", payload).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["id"].as_str().expect("created order has an id").to_string()
    }

    /// Claim an order for picking and return the session token.
    pub async fn claim(&self, order_id: &str, picker_id: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/orders/{order_id}/picking"),
                json!({ "pickerId": picker_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "claim failed: {body}");
        body["token"].as_str().expect("claim returns a token").to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A submission payload that passes every rule.
#[must_use]
pub fn order_payload() -> Value {
    json!({
        "customerName": "Ana Lima",
        "customerEmail": "ana@example.com",
        "customerPhone": "+55 11 5555-0100",
        "priority": "urgent",
        "items": [
            { "id": "item-a", "sku": "123456789012", "name": "Widget", "quantity": 5, "location": "A-01" },
            { "id": "item-b", "sku": "1234567890123", "quantity": 4, "binLocation": "B-02" }
        ]
    })
}
