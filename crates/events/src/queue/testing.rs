//! Scriptable in-memory broker for queue tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::queue::broker::{Broker, BrokerChannel};
use crate::queue::error::QueueError;
use crate::queue::message::QueueMessage;

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    /// Outcome of each connect, front first; `connect_default` once empty.
    pub connect_script: VecDeque<bool>,
    pub connect_default: bool,
    pub connect_attempts: Vec<Instant>,
    /// Handed out by `next_message`; an empty queue reads as a dropped
    /// subscription unless `hang_when_drained` is set.
    pub deliveries: VecDeque<QueueMessage>,
    pub hang_when_drained: bool,
    pub declared: Vec<String>,
    pub prefetch: Vec<u16>,
    pub acked: Vec<u64>,
    pub requeued: Vec<u64>,
    pub rejected: Vec<u64>,
    /// Put requeued deliveries back at the front, flagged as redelivered,
    /// the way a broker does with prefetch 1.
    pub redeliver_requeued: bool,
    /// Deliveries handed out and not yet settled.
    pub in_flight: Vec<QueueMessage>,
    pub published: Vec<(String, Vec<u8>)>,
    pub publish_delay: Option<Duration>,
    pub fail_publish: bool,
    pub closed_channels: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBroker {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBroker {
    pub fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn healthy() -> Self {
        let broker = Self::default();
        broker.lock().connect_default = true;
        broker
    }

    pub fn push_delivery(&self, delivery_tag: u64, payload: &[u8]) {
        self.lock().deliveries.push_back(QueueMessage {
            payload: payload.to_vec(),
            delivery_tag,
            redelivered: false,
        });
    }
}

#[async_trait]
impl Broker for FakeBroker {
    type Channel = FakeChannel;

    async fn connect(&self) -> Result<FakeChannel, QueueError> {
        let mut state = self.lock();
        state.connect_attempts.push(Instant::now());
        let fallback = state.connect_default;
        let ok = state.connect_script.pop_front().unwrap_or(fallback);

        if ok {
            Ok(FakeChannel {
                state: Arc::clone(&self.state),
                closed: false,
            })
        } else {
            Err(QueueError::Transport("connection refused".to_string()))
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeChannel {
    state: Arc<Mutex<FakeState>>,
    closed: bool,
}

impl FakeChannel {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl BrokerChannel for FakeChannel {
    async fn declare_queue(&mut self, queue: &str) -> Result<(), QueueError> {
        self.lock().declared.push(queue.to_string());
        Ok(())
    }

    async fn set_prefetch(&mut self, count: u16) -> Result<(), QueueError> {
        self.lock().prefetch.push(count);
        Ok(())
    }

    async fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), QueueError> {
        let delay = self.lock().publish_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.fail_publish {
            return Err(QueueError::Transport("channel closed".to_string()));
        }
        state.published.push((queue.to_string(), payload.to_vec()));
        Ok(())
    }

    async fn consume(&mut self, _queue: &str) -> Result<(), QueueError> {
        Ok(())
    }

    async fn next_message(&mut self) -> Result<QueueMessage, QueueError> {
        let (next, hang) = {
            let mut state = self.lock();
            (state.deliveries.pop_front(), state.hang_when_drained)
        };

        match next {
            Some(message) => {
                self.lock().in_flight.push(message.clone());
                Ok(message)
            }
            None if hang => std::future::pending().await,
            None => Err(QueueError::Transport("subscription closed".to_string())),
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> Result<(), QueueError> {
        let mut state = self.lock();
        state.in_flight.retain(|m| m.delivery_tag != delivery_tag);
        state.acked.push(delivery_tag);
        Ok(())
    }

    async fn requeue(&mut self, delivery_tag: u64) -> Result<(), QueueError> {
        let mut state = self.lock();
        state.requeued.push(delivery_tag);

        let position = state
            .in_flight
            .iter()
            .position(|m| m.delivery_tag == delivery_tag);
        if let Some(position) = position {
            let mut message = state.in_flight.remove(position);
            if state.redeliver_requeued {
                message.redelivered = true;
                state.deliveries.push_front(message);
            }
        }
        Ok(())
    }

    async fn reject(&mut self, delivery_tag: u64) -> Result<(), QueueError> {
        let mut state = self.lock();
        state.in_flight.retain(|m| m.delivery_tag != delivery_tag);
        state.rejected.push(delivery_tag);
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.lock().closed_channels += 1;
        }
    }
}
