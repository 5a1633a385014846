//! Route definitions for the `/order-events` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::order_events;
use crate::state::AppState;

/// Routes mounted at `/order-events`.
///
/// ```text
/// POST   /                          -> create_order_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(order_events::create_order_event))
}
