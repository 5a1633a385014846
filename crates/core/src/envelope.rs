//! The order event envelope propagated to live sessions and the queue.
//!
//! An [`EventEnvelope`] is built once on the write path, after the order
//! change has been committed, and is never mutated afterwards. Construction
//! is the only place where validation happens.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::OrderStatus;
use crate::types::{DbId, Timestamp};

/// Actor name used for changes made by the platform itself.
pub const ACTOR_SYSTEM: &str = "system";

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// What happened to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrderCreated,
    StatusChanged,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::StatusChanged => "status_changed",
        }
    }
}

// ---------------------------------------------------------------------------
// OrderDetails
// ---------------------------------------------------------------------------

/// Order fields carried alongside the event for out-of-process consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub customer_name: String,
    pub total_amount: f64,
}

// ---------------------------------------------------------------------------
// EventEnvelope
// ---------------------------------------------------------------------------

/// An order lifecycle event.
///
/// Constructed via [`EventEnvelope::new`] (string status, as received from a
/// request body) or [`EventEnvelope::from_status`] (typed status), and
/// enriched with [`with_details`](EventEnvelope::with_details) and
/// [`with_timestamp`](EventEnvelope::with_timestamp).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEnvelope {
    order_id: DbId,
    kind: EventKind,
    status: OrderStatus,
    actor: String,
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<OrderDetails>,
}

impl EventEnvelope {
    /// Build an envelope from a raw status name.
    ///
    /// Fails with [`CoreError::Validation`] when `status` is not one of the
    /// five recognised statuses or `order_id` is not positive.
    pub fn new(
        order_id: DbId,
        kind: EventKind,
        status: &str,
        actor: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let status = OrderStatus::from_str_value(status).map_err(CoreError::Validation)?;
        Self::from_status(order_id, kind, status, actor)
    }

    /// Build an envelope from an already-typed status.
    pub fn from_status(
        order_id: DbId,
        kind: EventKind,
        status: OrderStatus,
        actor: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if order_id <= 0 {
            return Err(CoreError::Validation(format!(
                "Order id must be positive, got {order_id}"
            )));
        }

        Ok(Self {
            order_id,
            kind,
            status,
            actor: actor.into(),
            timestamp: Utc::now(),
            details: None,
        })
    }

    /// Shorthand for a freshly created order, which always starts as `new`.
    pub fn order_created(order_id: DbId) -> Result<Self, CoreError> {
        Self::from_status(order_id, EventKind::OrderCreated, OrderStatus::New, ACTOR_SYSTEM)
    }

    /// Attach the customer name and order total.
    pub fn with_details(mut self, customer_name: impl Into<String>, total_amount: f64) -> Self {
        self.details = Some(OrderDetails {
            customer_name: customer_name.into(),
            total_amount,
        });
        self
    }

    /// Override the event time (defaults to construction time).
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn order_id(&self) -> DbId {
        self.order_id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn details(&self) -> Option<&OrderDetails> {
        self.details.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
