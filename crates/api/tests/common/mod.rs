#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use ordercast_events::{EventDispatcher, Hub, HubHandle, QueueConfig};
use tower::ServiceExt;

use ordercast_api::config::ServerConfig;
use ordercast_api::router::build_app_router;
use ordercast_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        mailbox_capacity: 16,
        queue: QueueConfig::default(),
    }
}

/// Build the full application router backed by a fresh hub and no queue
/// publisher. Returns the hub handle so tests can observe sessions.
pub fn build_test_app() -> (Router, HubHandle) {
    let config = test_config();
    let (hub, _hub_task) = Hub::start();
    let dispatcher = EventDispatcher::new(hub.clone(), None);

    let state = AppState {
        config: Arc::new(config.clone()),
        hub: hub.clone(),
        dispatcher,
    };

    (build_app_router(state, &config), hub)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
