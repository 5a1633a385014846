pub mod health;
pub mod order_events;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /order-events                                    dispatch an order event (POST)
/// ```
///
/// The WebSocket endpoint (`/ws`) and `/health` live at root level.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/order-events", order_events::router())
}
