//! Best-effort publishing of order events onto the durable queue.
//!
//! [`QueuePublisher`] owns one broker channel for its whole lifetime. A
//! failed publish is returned as a [`DeliveryError`] and never retried here;
//! the order change that produced the event has already been committed.

use std::time::Duration;

use async_trait::async_trait;
use ordercast_core::EventEnvelope;
use tokio::sync::Mutex;

use crate::dispatch::EventPublisher;
use crate::queue::broker::{Broker, BrokerChannel};
use crate::queue::config::QueueConfig;
use crate::queue::error::{DeliveryError, QueueError};
use crate::queue::message::OrderNotification;

/// Publishes [`OrderNotification`]s to a named durable queue.
pub struct QueuePublisher<C: BrokerChannel> {
    channel: Mutex<C>,
    queue_name: String,
    timeout: Duration,
}

impl<C: BrokerChannel> std::fmt::Debug for QueuePublisher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePublisher")
            .field("queue_name", &self.queue_name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<C: BrokerChannel> QueuePublisher<C> {
    /// Open a channel and declare the target queue.
    ///
    /// Fails when the broker is unreachable; callers are expected to run
    /// without a publisher in that case.
    pub async fn connect<B>(broker: &B, config: &QueueConfig) -> Result<Self, QueueError>
    where
        B: Broker<Channel = C>,
    {
        let mut channel = broker.connect().await?;
        if let Err(e) = channel.declare_queue(&config.queue_name).await {
            channel.close().await;
            return Err(e);
        }

        tracing::info!(queue = %config.queue_name, "Queue publisher ready");

        Ok(Self {
            channel: Mutex::new(channel),
            queue_name: config.queue_name.clone(),
            timeout: config.publish_timeout,
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Serialize and publish one envelope, bounded by the publish timeout.
    pub async fn publish(&self, envelope: &EventEnvelope) -> Result<(), DeliveryError> {
        let notification = OrderNotification::from(envelope);
        let body = serde_json::to_vec(&notification)?;

        let send = async {
            let mut channel = self.channel.lock().await;
            channel.publish(&self.queue_name, &body).await
        };

        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(())) => {
                tracing::info!(
                    order_id = notification.order_id,
                    status = %notification.status,
                    "Published order notification"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(order_id = notification.order_id, error = %e, "Failed to publish order notification");
                Err(e.into())
            }
            Err(_) => {
                tracing::warn!(
                    order_id = notification.order_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Publishing order notification timed out"
                );
                Err(DeliveryError::TimedOut(self.timeout))
            }
        }
    }

    /// Close the underlying channel and connection.
    pub async fn close(&self) {
        self.channel.lock().await.close().await;
    }
}

#[async_trait]
impl<C: BrokerChannel> EventPublisher for QueuePublisher<C> {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), DeliveryError> {
        QueuePublisher::publish(self, envelope).await
    }
}
