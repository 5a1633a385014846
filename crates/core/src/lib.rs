//! Shared domain types for the order event propagation services.
//!
//! Everything here is plain data: the [`EventEnvelope`] that travels through
//! the hub and the queue bridge, the [`OrderStatus`] it carries, and the
//! [`CoreError`] raised when an envelope fails validation.

pub mod envelope;
pub mod error;
pub mod status;
pub mod types;

pub use envelope::{EventEnvelope, EventKind, OrderDetails};
pub use error::CoreError;
pub use status::OrderStatus;
