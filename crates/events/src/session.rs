//! Hub-side representation of one live client connection.
//!
//! [`ClientSession::new`] creates the bounded mailbox for a connection. The
//! session (holding the only sender) is handed to the hub on registration;
//! the [`Mailbox`] (receiver) stays with the connection's writer. When the
//! hub drops the session the mailbox closes, and the writer drains whatever
//! is left before shutting the connection down.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::message::HubMessage;

/// Default number of messages a session may have pending before it is
/// treated as a slow consumer and dropped.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Identifier of a live session.
pub type SessionId = Uuid;

/// Receiving half of a session mailbox, drained by the connection writer.
pub type Mailbox = mpsc::Receiver<HubMessage>;

/// Outcome of a non-blocking enqueue onto a session mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Delivered,
    /// Mailbox at capacity.
    Full,
    /// The writer is gone.
    Closed,
}

/// One registered connection as seen by the hub.
#[derive(Debug)]
pub struct ClientSession {
    id: SessionId,
    outbox: mpsc::Sender<HubMessage>,
}

impl ClientSession {
    /// Create a session with a mailbox of the given capacity.
    ///
    /// A capacity of zero is bumped to one (tokio channels need at least one
    /// slot).
    pub fn new(capacity: usize) -> (Self, Mailbox) {
        let (outbox, mailbox) = mpsc::channel(capacity.max(1));
        let session = Self {
            id: Uuid::new_v4(),
            outbox,
        };
        (session, mailbox)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// `true` once the writer has dropped its mailbox.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }

    /// Enqueue without waiting.
    pub(crate) fn try_enqueue(&self, message: HubMessage) -> Enqueue {
        match self.outbox.try_send(message) {
            Ok(()) => Enqueue::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => Enqueue::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Enqueue::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use ordercast_core::EventEnvelope;

    use super::*;

    fn message(order_id: i64) -> HubMessage {
        HubMessage::order_update(&EventEnvelope::order_created(order_id).unwrap())
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let (a, _ma) = ClientSession::new(4);
        let (b, _mb) = ClientSession::new(4);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn try_enqueue_reports_full_mailbox() {
        let (session, _mailbox) = ClientSession::new(2);

        assert_eq!(session.try_enqueue(message(1)), Enqueue::Delivered);
        assert_eq!(session.try_enqueue(message(2)), Enqueue::Delivered);
        assert_eq!(session.try_enqueue(message(3)), Enqueue::Full);
    }

    #[test]
    fn try_enqueue_reports_closed_mailbox() {
        let (session, mailbox) = ClientSession::new(2);
        drop(mailbox);

        assert!(session.is_closed());
        assert_eq!(session.try_enqueue(message(1)), Enqueue::Closed);
    }

    #[tokio::test]
    async fn mailbox_preserves_enqueue_order() {
        let (session, mut mailbox) = ClientSession::new(8);
        for id in 1..=3 {
            session.try_enqueue(message(id));
        }
        drop(session);

        let mut seen = Vec::new();
        while let Some(msg) = mailbox.recv().await {
            seen.push(msg.payload.order_id);
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
