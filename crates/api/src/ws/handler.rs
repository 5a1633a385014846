use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::StreamExt;
use ordercast_events::{ClientSession, HubHandle};

use crate::state::AppState;
use crate::ws::session;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with the hub and driven by
/// a writer task and a reader loop (see [`session::run`]).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let capacity = state.config.mailbox_capacity;
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub, capacity))
}

/// Mount the WebSocket endpoint (root level).
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// Register a freshly upgraded socket and run it until it closes.
async fn handle_socket(socket: WebSocket, hub: HubHandle, capacity: usize) {
    let (client, mailbox) = ClientSession::new(capacity);
    let session_id = client.id();
    tracing::info!(session_id = %session_id, "WebSocket connected");

    hub.register(client).await;

    let (sink, stream) = socket.split();
    session::run(session_id, sink, stream, mailbox, hub).await;

    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}
