//! Session registry actor.
//!
//! [`Hub`] owns the set of live [`ClientSession`]s and is the only code that
//! touches it. All mutations arrive as [`HubCommand`]s on one bounded inbox
//! and are applied in order by a single spawned task, so registration,
//! removal and broadcast never race and need no locks. Callers talk to the
//! hub through a cloneable [`HubHandle`].

use std::collections::HashMap;

use ordercast_core::EventEnvelope;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::message::HubMessage;
use crate::session::{ClientSession, Enqueue, SessionId};

/// Default buffer capacity for the hub inbox.
const DEFAULT_INBOX_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Requests processed by the hub task.
#[derive(Debug)]
enum HubCommand {
    Register(ClientSession),
    Unregister(SessionId),
    Broadcast(HubMessage),
    SessionCount(oneshot::Sender<usize>),
    Shutdown,
}

/// Why a session left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    Unregistered,
    /// Mailbox was at capacity during a broadcast.
    SlowConsumer,
    /// Writer dropped its mailbox before unregistering.
    WriterGone,
}

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// The registry owner. Never shared; lives inside its task.
pub struct Hub {
    sessions: HashMap<SessionId, ClientSession>,
    inbox: mpsc::Receiver<HubCommand>,
}

impl Hub {
    /// Spawn the hub task with the default inbox capacity.
    ///
    /// Must be called from within a tokio runtime. The task runs until
    /// [`HubHandle::shutdown`] is called or every handle has been dropped.
    pub fn start() -> (HubHandle, JoinHandle<()>) {
        Self::start_with_capacity(DEFAULT_INBOX_CAPACITY)
    }

    /// Spawn the hub task with a specific inbox capacity.
    pub fn start_with_capacity(inbox_capacity: usize) -> (HubHandle, JoinHandle<()>) {
        let (sender, inbox) = mpsc::channel(inbox_capacity.max(1));
        let hub = Self {
            sessions: HashMap::new(),
            inbox,
        };
        let task = tokio::spawn(hub.run());
        (HubHandle { sender }, task)
    }

    async fn run(mut self) {
        tracing::info!("Hub started");

        while let Some(command) = self.inbox.recv().await {
            match command {
                HubCommand::Register(session) => self.register(session),
                HubCommand::Unregister(id) => self.remove(id, DropReason::Unregistered),
                HubCommand::Broadcast(message) => self.broadcast(message),
                HubCommand::SessionCount(reply) => {
                    let _ = reply.send(self.sessions.len());
                }
                HubCommand::Shutdown => break,
            }
        }

        // Dropping the sessions closes every mailbox; writers drain and exit.
        let count = self.sessions.len();
        self.sessions.clear();
        tracing::info!(count, "Hub stopped, closed all session mailboxes");
    }

    fn register(&mut self, session: ClientSession) {
        let id = session.id();
        self.sessions.insert(id, session);
        tracing::info!(session_id = %id, sessions = self.sessions.len(), "Session registered");
    }

    fn remove(&mut self, id: SessionId, reason: DropReason) {
        if self.sessions.remove(&id).is_none() {
            return;
        }

        match reason {
            DropReason::Unregistered => {
                tracing::info!(session_id = %id, sessions = self.sessions.len(), "Session unregistered");
            }
            DropReason::SlowConsumer => {
                tracing::warn!(session_id = %id, sessions = self.sessions.len(), "Session mailbox full, dropping slow consumer");
            }
            DropReason::WriterGone => {
                tracing::debug!(session_id = %id, sessions = self.sessions.len(), "Session writer gone, dropping session");
            }
        }
    }

    fn broadcast(&mut self, message: HubMessage) {
        if self.sessions.is_empty() {
            tracing::debug!(order_id = message.payload.order_id, "No sessions connected, broadcast dropped");
            return;
        }

        let mut dropped = Vec::new();
        for (id, session) in &self.sessions {
            match session.try_enqueue(message.clone()) {
                Enqueue::Delivered => {}
                Enqueue::Full => dropped.push((*id, DropReason::SlowConsumer)),
                Enqueue::Closed => dropped.push((*id, DropReason::WriterGone)),
            }
        }

        let delivered = self.sessions.len() - dropped.len();
        for (id, reason) in dropped {
            self.remove(id, reason);
        }

        tracing::debug!(
            order_id = message.payload.order_id,
            new_status = %message.payload.new_status,
            delivered,
            "Broadcast order update"
        );
    }
}

// ---------------------------------------------------------------------------
// HubHandle
// ---------------------------------------------------------------------------

/// Cheap, cloneable access to a running [`Hub`].
///
/// Every method enqueues a command and returns once the hub has accepted it.
/// Commands sent after the hub has stopped are dropped.
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Add a session to the registry.
    pub async fn register(&self, session: ClientSession) {
        self.send(HubCommand::Register(session)).await;
    }

    /// Remove a session and close its mailbox. Unknown ids are ignored.
    pub async fn unregister(&self, id: SessionId) {
        self.send(HubCommand::Unregister(id)).await;
    }

    /// Fan an envelope out to every registered session.
    ///
    /// Sessions whose mailbox is full are dropped by the hub; nothing is
    /// reported back to the caller.
    pub async fn broadcast(&self, envelope: &EventEnvelope) {
        self.send(HubCommand::Broadcast(HubMessage::order_update(envelope)))
            .await;
    }

    /// Number of registered sessions, as seen after every command sent
    /// before this one. Returns 0 when the hub is not running.
    pub async fn session_count(&self) -> usize {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::SessionCount(reply)).await;
        response.await.unwrap_or(0)
    }

    /// Stop the hub task, closing every session mailbox.
    pub async fn shutdown(&self) {
        self.send(HubCommand::Shutdown).await;
    }

    async fn send(&self, command: HubCommand) {
        if self.sender.send(command).await.is_err() {
            tracing::debug!("Hub is not running, command dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use ordercast_core::{EventKind, OrderStatus};

    use super::*;
    use crate::session::Mailbox;

    fn shipped(order_id: i64) -> EventEnvelope {
        EventEnvelope::new(order_id, EventKind::StatusChanged, "shipped", "admin").unwrap()
    }

    async fn connect(hub: &HubHandle, capacity: usize) -> (SessionId, Mailbox) {
        let (session, mailbox) = ClientSession::new(capacity);
        let id = session.id();
        hub.register(session).await;
        (id, mailbox)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_session_once_in_order() {
        let (hub, _task) = Hub::start();
        let mut mailboxes = Vec::new();
        for _ in 0..3 {
            mailboxes.push(connect(&hub, 8).await.1);
        }

        hub.broadcast(&shipped(1)).await;
        hub.broadcast(&shipped(2)).await;
        hub.shutdown().await;

        for mut mailbox in mailboxes {
            let mut seen = Vec::new();
            while let Some(message) = mailbox.recv().await {
                seen.push(message.payload.order_id);
            }
            assert_eq!(seen, vec![1, 2]);
        }
    }

    #[tokio::test]
    async fn broadcast_with_no_sessions_is_dropped() {
        let (hub, _task) = Hub::start();

        hub.broadcast(&shipped(1)).await;

        assert_eq!(hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn full_mailbox_session_is_removed_during_broadcast() {
        let (hub, _task) = Hub::start();
        let (_slow_id, mut slow) = connect(&hub, 1).await;
        let (_fast_id, mut fast) = connect(&hub, 8).await;

        hub.broadcast(&shipped(1)).await;
        hub.broadcast(&shipped(2)).await;
        assert_eq!(hub.session_count().await, 1);

        hub.broadcast(&shipped(3)).await;

        // The slow session kept only the message that fit, then closed.
        assert_eq!(slow.recv().await.unwrap().payload.order_id, 1);
        assert!(slow.recv().await.is_none());

        for expected in 1..=3 {
            assert_eq!(fast.recv().await.unwrap().payload.order_id, expected);
        }
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let (hub, _task) = Hub::start();
        let (id, mut mailbox) = connect(&hub, 8).await;

        hub.unregister(id).await;
        hub.unregister(id).await;
        hub.unregister(SessionId::new_v4()).await;

        assert_eq!(hub.session_count().await, 0);
        assert!(mailbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_mailbox_session_is_pruned_on_broadcast() {
        let (hub, _task) = Hub::start();
        let (_id, mailbox) = connect(&hub, 8).await;
        drop(mailbox);

        hub.broadcast(&shipped(1)).await;

        assert_eq!(hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn saturated_session_is_dropped_while_others_keep_receiving() {
        let (hub, _task) = Hub::start();
        let (_a, mut a) = connect(&hub, 8).await;
        let (_b, mut b) = connect(&hub, 8).await;
        let (_c, mut c) = connect(&hub, 1).await;
        assert_eq!(hub.session_count().await, 3);

        hub.broadcast(&shipped(42)).await;
        for mailbox in [&mut a, &mut b] {
            let message = mailbox.recv().await.unwrap();
            assert_eq!(message.message_type, "order_update");
            assert_eq!(message.payload.order_id, 42);
            assert_eq!(message.payload.new_status, OrderStatus::Shipped);
        }

        // c has not drained its single slot, so it is saturated now.
        hub.broadcast(&shipped(42)).await;
        assert_eq!(hub.session_count().await, 2);

        assert_eq!(a.recv().await.unwrap().payload.order_id, 42);
        assert_eq!(b.recv().await.unwrap().payload.order_id, 42);
        assert_eq!(c.recv().await.unwrap().payload.new_status, OrderStatus::Shipped);
        assert!(c.recv().await.is_none());
    }

    #[tokio::test]
    async fn shutdown_closes_mailboxes_and_stops_task() {
        let (hub, task) = Hub::start();
        let (_id, mut mailbox) = connect(&hub, 8).await;

        hub.shutdown().await;
        task.await.unwrap();

        assert!(mailbox.recv().await.is_none());
        assert_eq!(hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn hub_stops_when_all_handles_are_dropped() {
        let (hub, task) = Hub::start();
        let (_id, mut mailbox) = connect(&hub, 8).await;

        drop(hub);
        task.await.unwrap();

        assert!(mailbox.recv().await.is_none());
    }
}
