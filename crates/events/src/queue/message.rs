//! Queue wire types.

use ordercast_core::types::{DbId, Timestamp};
use ordercast_core::{EventEnvelope, OrderStatus};
use serde::{Deserialize, Serialize};

/// Content type of every published payload.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// JSON body published for every order event.
///
/// ```json
/// {"order_id": 7, "customer_name": "Jan Kowalski", "status": "new",
///  "total_amount": 149.5, "timestamp": "2025-03-01T12:00:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub order_id: DbId,
    #[serde(default)]
    pub customer_name: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: f64,
    pub timestamp: Timestamp,
}

impl From<&EventEnvelope> for OrderNotification {
    fn from(envelope: &EventEnvelope) -> Self {
        let (customer_name, total_amount) = envelope
            .details()
            .map(|d| (d.customer_name.clone(), d.total_amount))
            .unwrap_or_default();

        Self {
            order_id: envelope.order_id(),
            customer_name,
            status: envelope.status(),
            total_amount,
            timestamp: envelope.timestamp(),
        }
    }
}

/// One delivery pulled from the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// Raw body, normally an [`OrderNotification`].
    pub payload: Vec<u8>,
    /// Opaque handle used to ack or reject this delivery.
    pub delivery_tag: u64,
    /// Set by the broker when a previous delivery was never acknowledged.
    pub redelivered: bool,
}
