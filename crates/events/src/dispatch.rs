//! Entry point for the order write path.
//!
//! After an order change has been committed, the write path hands the
//! resulting [`EventEnvelope`] to [`EventDispatcher::dispatch`]. The envelope
//! is broadcast to live sessions through the hub and, when a queue publisher
//! is available, published for other processes. Neither step can fail the
//! caller: hub drops are absorbed by the hub and publish failures are logged.

use std::sync::Arc;

use async_trait::async_trait;
use ordercast_core::EventEnvelope;

use crate::hub::HubHandle;
use crate::queue::error::DeliveryError;

/// Cross-process delivery of envelopes.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), DeliveryError>;
}

/// Fans committed order events out to every observer.
#[derive(Clone)]
pub struct EventDispatcher {
    hub: HubHandle,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl EventDispatcher {
    /// `publisher` is `None` when the broker was unreachable at startup;
    /// events then reach live sessions only.
    pub fn new(hub: HubHandle, publisher: Option<Arc<dyn EventPublisher>>) -> Self {
        if publisher.is_none() {
            tracing::warn!("No queue publisher configured, events will not leave this process");
        }
        Self { hub, publisher }
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher.is_some()
    }

    /// Broadcast and publish one envelope.
    pub async fn dispatch(&self, envelope: &EventEnvelope) {
        self.hub.broadcast(envelope).await;

        let Some(publisher) = &self.publisher else {
            return;
        };

        if let Err(e) = publisher.publish(envelope).await {
            tracing::warn!(
                order_id = envelope.order_id(),
                error = %e,
                "Queue delivery failed, order change is unaffected"
            );
        }
    }
}
