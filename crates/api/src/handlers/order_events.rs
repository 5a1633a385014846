//! Handlers for the `/order-events` resource.
//!
//! The order write path posts here after committing a change; the handler
//! validates the event and hands it to the [`EventDispatcher`](ordercast_events::EventDispatcher).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ordercast_core::envelope::ACTOR_SYSTEM;
use ordercast_core::types::DbId;
use ordercast_core::{EventEnvelope, EventKind};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /order-events`.
#[derive(Debug, Deserialize)]
pub struct OrderEventRequest {
    pub order_id: DbId,
    pub kind: EventKind,
    /// Raw status name; validated into an `OrderStatus`.
    pub status: String,
    /// Who made the change. Defaults to `system`.
    pub actor: Option<String>,
    pub customer_name: Option<String>,
    pub total_amount: Option<f64>,
}

/// POST /api/v1/order-events
///
/// Validate and dispatch one order event. Returns 202 with the accepted
/// envelope; delivery to observers is best-effort.
pub async fn create_order_event(
    State(state): State<AppState>,
    Json(body): Json<OrderEventRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<EventEnvelope>>)> {
    let actor = match body.actor {
        Some(actor) if actor.trim().is_empty() => {
            return Err(AppError::BadRequest("actor must not be empty".to_string()));
        }
        Some(actor) => actor,
        None => ACTOR_SYSTEM.to_string(),
    };

    let mut envelope = EventEnvelope::new(body.order_id, body.kind, &body.status, actor)?;
    if body.customer_name.is_some() || body.total_amount.is_some() {
        envelope = envelope.with_details(
            body.customer_name.unwrap_or_default(),
            body.total_amount.unwrap_or_default(),
        );
    }

    state.dispatcher.dispatch(&envelope).await;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: envelope })))
}
