//! Durable queue bridge.
//!
//! The same order events that the hub fans out in-process are carried to
//! other processes through a durable broker queue:
//!
//! - [`QueuePublisher`] -- best-effort, timeout-bounded publish of an
//!   envelope as an [`OrderNotification`].
//! - [`QueueConsumer`] -- at-least-once consumption with manual acks,
//!   prefetch 1 and linear-backoff reconnects.
//! - [`Broker`] / [`BrokerChannel`] -- the transport seam; [`AmqpBroker`]
//!   talks AMQP 0.9.1 via `lapin`.

pub mod amqp;
pub mod broker;
pub mod config;
pub mod consumer;
pub mod error;
pub mod message;
pub mod publisher;
pub mod reconnect;

#[cfg(test)]
pub(crate) mod testing;

pub use amqp::AmqpBroker;
pub use broker::{Broker, BrokerChannel};
pub use config::{parse_var, ConfigError, QueueConfig};
pub use consumer::{MessageHandler, QueueConsumer};
pub use error::{DeliveryError, QueueError};
pub use message::{OrderNotification, QueueMessage};
pub use publisher::QueuePublisher;
pub use reconnect::ReconnectPolicy;
