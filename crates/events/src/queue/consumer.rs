//! At-least-once consumption from the durable queue.
//!
//! [`QueueConsumer::run`] drives an explicit connection state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (message loop) -> Disconnected
//! ```
//!
//! Each delivery is handed to a [`MessageHandler`]. Only a successful
//! handler run acknowledges the delivery. A first failure waits one backoff
//! step and hands the delivery back to the broker for redelivery, so
//! handlers must tolerate seeing the same event twice. A delivery that fails
//! again after redelivery is rejected without requeue and goes to the
//! queue's dead-letter exchange, so one bad message cannot hold the queue.
//! Prefetch is capped (1 by default) so at most that many deliveries are
//! ever outstanding.
//!
//! Transport failures trigger the reconnect procedure described by
//! [`ReconnectPolicy`]. When it is exhausted `run` returns
//! [`QueueError::ReconnectExhausted`]; it never stops silently.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::queue::broker::{Broker, BrokerChannel};
use crate::queue::config::QueueConfig;
use crate::queue::error::QueueError;
use crate::queue::message::QueueMessage;
use crate::queue::reconnect::ReconnectPolicy;

// ---------------------------------------------------------------------------
// MessageHandler
// ---------------------------------------------------------------------------

/// Processes the raw payload of one delivery.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    type Error: std::fmt::Display + Send;

    async fn handle(&self, payload: &[u8]) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Connection lifecycle, owned by the `run` loop alone.
enum ConnectionState<C> {
    Disconnected,
    Connecting,
    Connected(C),
}

// ---------------------------------------------------------------------------
// QueueConsumer
// ---------------------------------------------------------------------------

/// Pulls deliveries from one durable queue.
pub struct QueueConsumer<B: Broker> {
    broker: B,
    queue_name: String,
    prefetch: u16,
    policy: ReconnectPolicy,
}

impl<B: Broker> QueueConsumer<B> {
    pub fn new(broker: B, config: &QueueConfig) -> Self {
        Self {
            broker,
            queue_name: config.queue_name.clone(),
            prefetch: config.prefetch,
            policy: ReconnectPolicy::from_config(config),
        }
    }

    /// Consume until cancelled or until reconnecting fails.
    ///
    /// Returns `Ok(())` only after `cancel` fires.
    pub async fn run<H: MessageHandler>(
        &self,
        handler: &H,
        cancel: CancellationToken,
    ) -> Result<(), QueueError> {
        let mut state = ConnectionState::Disconnected;

        loop {
            state = match state {
                ConnectionState::Disconnected => ConnectionState::Connecting,
                ConnectionState::Connecting => match self.reconnect(&cancel).await? {
                    Some(channel) => ConnectionState::Connected(channel),
                    None => {
                        tracing::info!("Queue consumer cancelled while connecting");
                        return Ok(());
                    }
                },
                ConnectionState::Connected(mut channel) => {
                    let outcome = self.consume(&mut channel, handler, &cancel).await;
                    channel.close().await;

                    match outcome {
                        Ok(()) => {
                            tracing::info!(queue = %self.queue_name, "Queue consumer stopped");
                            return Ok(());
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Lost broker connection");
                            ConnectionState::Disconnected
                        }
                    }
                }
            };
        }
    }

    /// Try to (re)establish the subscription, backing off between attempts.
    ///
    /// `Ok(None)` means the consumer was cancelled while waiting.
    async fn reconnect(&self, cancel: &CancellationToken) -> Result<Option<B::Channel>, QueueError> {
        let max_attempts = self.policy.max_attempts();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            match self.open_subscription().await {
                Ok(channel) => {
                    tracing::info!(
                        queue = %self.queue_name,
                        attempt,
                        prefetch = self.prefetch,
                        "Consuming from queue"
                    );
                    return Ok(Some(channel));
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "Broker connection failed, retrying"
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::error!(attempts = max_attempts, "Giving up on broker connection");
        Err(QueueError::ReconnectExhausted {
            attempts: max_attempts,
        })
    }

    /// Connect, declare the queue, set prefetch and subscribe.
    async fn open_subscription(&self) -> Result<B::Channel, QueueError> {
        let mut channel = self.broker.connect().await?;

        let setup = async {
            channel.declare_queue(&self.queue_name).await?;
            channel.set_prefetch(self.prefetch).await?;
            channel.consume(&self.queue_name).await
        }
        .await;

        match setup {
            Ok(()) => Ok(channel),
            Err(e) => {
                channel.close().await;
                Err(e)
            }
        }
    }

    /// Message loop for one connection. Returns `Ok(())` on cancellation and
    /// the transport error otherwise.
    async fn consume<H: MessageHandler>(
        &self,
        channel: &mut B::Channel,
        handler: &H,
        cancel: &CancellationToken,
    ) -> Result<(), QueueError> {
        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                message = channel.next_message() => message?,
            };

            self.process(channel, handler, message, cancel).await?;
        }
    }

    async fn process<H: MessageHandler>(
        &self,
        channel: &mut B::Channel,
        handler: &H,
        message: QueueMessage,
        cancel: &CancellationToken,
    ) -> Result<(), QueueError> {
        let delivery_tag = message.delivery_tag;
        tracing::debug!(
            delivery_tag,
            redelivered = message.redelivered,
            bytes = message.payload.len(),
            "Received queue message"
        );

        match handler.handle(&message.payload).await {
            Ok(()) => {
                channel.ack(delivery_tag).await?;
                tracing::debug!(delivery_tag, "Acknowledged queue message");
            }
            Err(e) if message.redelivered => {
                tracing::error!(
                    delivery_tag,
                    error = %e,
                    "Message handler failed on redelivery, dead-lettering message"
                );
                channel.reject(delivery_tag).await?;
            }
            Err(e) => {
                let delay = self.policy.delay_for(1);
                tracing::warn!(
                    delivery_tag,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Message handler failed, returning message to queue"
                );

                // Cancellation cuts the wait short; the message is still requeued.
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
                channel.requeue(delivery_tag).await?;
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
