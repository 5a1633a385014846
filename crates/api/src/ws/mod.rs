//! WebSocket infrastructure for live order updates.
//!
//! Provides the HTTP upgrade handler and the per-connection reader/writer
//! loops. Session bookkeeping lives in the hub (`ordercast_events::Hub`).

mod handler;
pub mod session;

pub use handler::{router, ws_handler};
