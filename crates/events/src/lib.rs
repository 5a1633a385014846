//! Order event propagation.
//!
//! This crate moves [`EventEnvelope`](ordercast_core::EventEnvelope)s from
//! the order write path to their observers:
//!
//! - [`Hub`] -- single-task actor that owns the set of live client sessions
//!   and fans every broadcast out to their bounded mailboxes.
//! - [`ClientSession`] -- the hub-side half of one live connection.
//! - [`EventDispatcher`] -- the entry point the write path calls after a
//!   committed change; broadcasts and, when available, publishes.
//! - [`queue`] -- the durable queue bridge: [`QueuePublisher`] and
//!   [`QueueConsumer`] over a pluggable [`Broker`] (AMQP in production).

pub mod dispatch;
pub mod hub;
pub mod message;
pub mod queue;
pub mod session;

pub use dispatch::{EventDispatcher, EventPublisher};
pub use hub::{Hub, HubHandle};
pub use message::{HubMessage, OrderUpdate};
pub use queue::{
    AmqpBroker, Broker, BrokerChannel, ConfigError, DeliveryError, MessageHandler, OrderNotification,
    QueueConfig, QueueConsumer, QueueError, QueueMessage, QueuePublisher, ReconnectPolicy,
};
pub use session::{ClientSession, Mailbox, SessionId, DEFAULT_MAILBOX_CAPACITY};
