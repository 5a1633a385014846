//! Messages delivered to live sessions.
//!
//! Every hub broadcast reaches the client as a JSON text frame:
//!
//! ```json
//! {"type": "order_update", "payload": {"order_id": 42, "new_status": "shipped", "updated_by": "admin"}}
//! ```

use ordercast_core::types::DbId;
use ordercast_core::{EventEnvelope, OrderStatus};
use serde::{Deserialize, Serialize};

/// Message type tag for order updates.
pub const MSG_TYPE_ORDER_UPDATE: &str = "order_update";

/// Payload of an `order_update` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_id: DbId,
    pub new_status: OrderStatus,
    pub updated_by: String,
}

/// Outbound hub message, one per mailbox slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: OrderUpdate,
}

impl HubMessage {
    /// Build the `order_update` message for an envelope.
    ///
    /// Both creations and status changes are reported as `order_update`;
    /// clients only care about the resulting status.
    pub fn order_update(envelope: &EventEnvelope) -> Self {
        Self {
            message_type: MSG_TYPE_ORDER_UPDATE.to_string(),
            payload: OrderUpdate {
                order_id: envelope.order_id(),
                new_status: envelope.status(),
                updated_by: envelope.actor().to_string(),
            },
        }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use ordercast_core::EventKind;

    use super::*;

    #[test]
    fn order_update_wire_shape() {
        let envelope = EventEnvelope::new(42, EventKind::StatusChanged, "shipped", "admin").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&HubMessage::order_update(&envelope).to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "order_update");
        assert_eq!(json["payload"]["order_id"], 42);
        assert_eq!(json["payload"]["new_status"], "shipped");
        assert_eq!(json["payload"]["updated_by"], "admin");
    }

    #[test]
    fn created_orders_are_reported_as_updates() {
        let envelope = EventEnvelope::order_created(8).unwrap();
        let message = HubMessage::order_update(&envelope);

        assert_eq!(message.message_type, MSG_TYPE_ORDER_UPDATE);
        assert_eq!(message.payload.new_status, OrderStatus::New);
        assert_eq!(message.payload.updated_by, "system");
    }
}
