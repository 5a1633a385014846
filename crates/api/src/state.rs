use std::sync::Arc;

use ordercast_events::{EventDispatcher, HubHandle};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Handle to the session hub (WebSocket clients).
    pub hub: HubHandle,
    /// Broadcasts and publishes committed order events.
    pub dispatcher: EventDispatcher,
}
