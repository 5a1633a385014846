//! Reader and writer loops for one registered WebSocket session.
//!
//! The writer owns the sink and the mailbox; it is the only code that closes
//! the connection. The reader owns the stream; when the peer goes away it
//! unregisters the session, which closes the mailbox and lets the writer
//! finish. A shared [`CancellationToken`] stops whichever loop is still
//! running once the other one has exited.

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use ordercast_events::{HubHandle, Mailbox, SessionId};
use tokio_util::sync::CancellationToken;

/// Drive a session until both loops have finished.
pub async fn run<S, R>(
    session_id: SessionId,
    sink: S,
    stream: R,
    mailbox: Mailbox,
    hub: HubHandle,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::fmt::Display + Send,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let teardown = CancellationToken::new();

    let writer = tokio::spawn(write_loop(session_id, sink, mailbox, teardown.clone()));

    read_loop(session_id, stream, &teardown).await;

    // Idempotent: the hub may already have dropped this session.
    hub.unregister(session_id).await;
    teardown.cancel();

    if let Err(e) = writer.await {
        tracing::error!(session_id = %session_id, error = %e, "WebSocket writer task failed");
    }
}

/// Forward mailbox messages to the socket as JSON text frames.
///
/// Sends a close frame once the mailbox is closed and drained. Stops early
/// on a send error or when teardown is signalled.
async fn write_loop<S>(
    session_id: SessionId,
    mut sink: S,
    mut mailbox: Mailbox,
    teardown: CancellationToken,
) where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    loop {
        let next = tokio::select! {
            _ = teardown.cancelled() => break,
            next = mailbox.recv() => next,
        };

        let Some(message) = next else {
            if let Err(e) = sink.send(Message::Close(None)).await {
                tracing::debug!(session_id = %session_id, error = %e, "Failed to send close frame");
            }
            break;
        };

        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to encode hub message");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text.into())).await {
            tracing::debug!(session_id = %session_id, error = %e, "WebSocket send failed");
            break;
        }
    }

    teardown.cancel();
    if let Err(e) = sink.close().await {
        tracing::trace!(session_id = %session_id, error = %e, "WebSocket sink already closed");
    }
}

/// Consume inbound frames until the peer leaves or teardown is signalled.
async fn read_loop<R>(session_id: SessionId, mut stream: R, teardown: &CancellationToken)
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = teardown.cancelled() => break,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(Message::Text(text))) => {
                tracing::debug!(session_id = %session_id, text = %text.as_str(), "Inbound WebSocket message");
            }
            Some(Ok(_)) => {
                tracing::trace!(session_id = %session_id, "Inbound control or binary frame");
            }
            Some(Err(e)) => {
                tracing::debug!(session_id = %session_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc;
    use ordercast_core::{EventEnvelope, EventKind};
    use ordercast_events::{ClientSession, Hub};

    use super::*;

    struct Harness {
        hub: HubHandle,
        session_id: SessionId,
        inbound: mpsc::UnboundedSender<Result<Message, axum::Error>>,
        outbound: mpsc::UnboundedReceiver<Message>,
        task: tokio::task::JoinHandle<()>,
    }

    async fn start_session() -> Harness {
        let (hub, _hub_task) = Hub::start();
        let (client, mailbox) = ClientSession::new(8);
        let session_id = client.id();
        hub.register(client).await;

        let (sink, outbound) = mpsc::unbounded::<Message>();
        let (inbound, stream) = mpsc::unbounded::<Result<Message, axum::Error>>();

        let task = tokio::spawn(run(session_id, sink, stream, mailbox, hub.clone()));

        Harness {
            hub,
            session_id,
            inbound,
            outbound,
            task,
        }
    }

    fn text_of(message: Message) -> serde_json::Value {
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broadcast_is_written_as_order_update_frame() {
        let mut h = start_session().await;
        let envelope = EventEnvelope::new(42, EventKind::StatusChanged, "shipped", "admin").unwrap();

        h.hub.broadcast(&envelope).await;

        let json = text_of(h.outbound.next().await.unwrap());
        assert_eq!(json["type"], "order_update");
        assert_eq!(json["payload"]["order_id"], 42);
        assert_eq!(json["payload"]["new_status"], "shipped");
        assert_eq!(json["payload"]["updated_by"], "admin");
    }

    #[tokio::test]
    async fn peer_disconnect_unregisters_the_session() {
        let h = start_session().await;
        assert_eq!(h.hub.session_count().await, 1);

        drop(h.inbound);
        h.task.await.unwrap();

        assert_eq!(h.hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn close_frame_from_peer_ends_the_session() {
        let h = start_session().await;

        h.inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
        h.task.await.unwrap();

        assert_eq!(h.hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn inbound_text_is_ignored() {
        let mut h = start_session().await;

        h.inbound
            .unbounded_send(Ok(Message::Text("{\"type\":\"hello\"}".into())))
            .unwrap();
        h.hub
            .broadcast(&EventEnvelope::order_created(5).unwrap())
            .await;

        let json = text_of(h.outbound.next().await.unwrap());
        assert_eq!(json["payload"]["order_id"], 5);
        assert_eq!(h.hub.session_count().await, 1);
    }

    #[tokio::test]
    async fn unregister_drains_mailbox_then_sends_close_frame() {
        let mut h = start_session().await;

        h.hub
            .broadcast(&EventEnvelope::order_created(1).unwrap())
            .await;
        h.hub.unregister(h.session_id).await;

        let first = text_of(h.outbound.next().await.unwrap());
        assert_eq!(first["payload"]["order_id"], 1);
        assert!(matches!(h.outbound.next().await, Some(Message::Close(None))));

        // The writer signals teardown, so the reader stops without the peer.
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn writer_failure_tears_the_session_down() {
        let h = start_session().await;

        drop(h.outbound);
        h.hub
            .broadcast(&EventEnvelope::order_created(3).unwrap())
            .await;
        h.task.await.unwrap();

        assert_eq!(h.hub.session_count().await, 0);
    }

    #[tokio::test]
    async fn receive_error_ends_the_session() {
        let h = start_session().await;

        h.inbound
            .unbounded_send(Err(axum::Error::new(std::io::Error::other("reset"))))
            .unwrap();
        h.task.await.unwrap();

        assert_eq!(h.hub.session_count().await, 0);
    }
}
