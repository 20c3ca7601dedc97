//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eventide_api::state::AppState;
use eventide_core::bus::{EventBus, InProcessEventBus};
use eventide_event_store::InMemoryEventStore;
use eventide_ordering::application::notifications::CustomerNotifier;
use eventide_ordering::wiring::{order_repository, subscribe_to_order_events};
use eventide_test_support::FixedClock;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// The pieces of a test app that assertions look behind.
pub struct TestApp {
    pub store: InMemoryEventStore,
    pub notifier: Arc<CustomerNotifier>,
    state: AppState,
}

impl TestApp {
    /// A fresh router over the shared state. `oneshot` consumes the router,
    /// so take one per request.
    pub fn router(&self) -> Router {
        eventide_api::app(self.state.clone())
    }
}

/// Build the full app over an in-memory store, a fixed clock and a bus with
/// the customer notifier subscribed. Uses the same wiring as `main.rs`.
pub fn build_test_app() -> TestApp {
    let store = InMemoryEventStore::new();
    let notifier = Arc::new(CustomerNotifier::new());
    let mut bus = InProcessEventBus::new();
    subscribe_to_order_events(&mut bus, notifier.clone());
    let bus: Arc<dyn EventBus> = Arc::new(bus);
    let repository = order_repository(Arc::new(store.clone()), Some(bus)).unwrap();
    let state = AppState::new(Arc::new(FixedClock::reference()), Arc::new(repository));

    TestApp {
        store,
        notifier,
        state,
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}
