//! Transport seam between the queue bridge and a concrete broker.
//!
//! A [`Broker`] knows how to open a fresh connection; the returned
//! [`BrokerChannel`] is owned by exactly one publisher or consumer and is
//! never shared between the two roles.

use async_trait::async_trait;

use crate::queue::error::QueueError;
use crate::queue::message::QueueMessage;

/// Factory for broker channels.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    type Channel: BrokerChannel;

    /// Open a new connection and channel.
    async fn connect(&self) -> Result<Self::Channel, QueueError>;
}

/// One open broker channel.
#[async_trait]
pub trait BrokerChannel: Send + 'static {
    /// Declare `queue` as durable, non-exclusive, not auto-deleted.
    /// Declaring an existing queue with the same flags is a no-op.
    async fn declare_queue(&mut self, queue: &str) -> Result<(), QueueError>;

    /// Limit unacknowledged deliveries on this channel.
    async fn set_prefetch(&mut self, count: u16) -> Result<(), QueueError>;

    /// Publish a persistent JSON message to `queue` through the default
    /// exchange and wait for the broker to confirm it.
    async fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), QueueError>;

    /// Start a manual-ack subscription on `queue`.
    async fn consume(&mut self, queue: &str) -> Result<(), QueueError>;

    /// Wait for the next delivery of the active subscription. A closed
    /// subscription is reported as [`QueueError::Transport`].
    async fn next_message(&mut self) -> Result<QueueMessage, QueueError>;

    /// Acknowledge a delivery.
    async fn ack(&mut self, delivery_tag: u64) -> Result<(), QueueError>;

    /// Reject a delivery and ask the broker to requeue it.
    async fn requeue(&mut self, delivery_tag: u64) -> Result<(), QueueError>;

    /// Reject a delivery without requeueing. The broker routes it to the
    /// queue's dead-letter exchange, or discards it when none is set.
    async fn reject(&mut self, delivery_tag: u64) -> Result<(), QueueError>;

    /// Close the channel and its connection. Safe to call more than once.
    async fn close(&mut self);
}
