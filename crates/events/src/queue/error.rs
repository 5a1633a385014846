use std::time::Duration;

/// Broker-level failures.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Connection, channel or protocol failure. Triggers a reconnect on the
    /// consumer side.
    #[error("Broker transport error: {0}")]
    Transport(String),

    /// Every reconnect attempt failed. Fatal for the consumer.
    #[error("Broker unreachable after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },
}

impl From<lapin::Error> for QueueError {
    fn from(err: lapin::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A publish that did not reach the broker. Never fatal to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Publish timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Transport(#[from] QueueError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_exhausted_display() {
        let err = QueueError::ReconnectExhausted { attempts: 5 };
        assert_eq!(err.to_string(), "Broker unreachable after 5 reconnect attempts");
    }

    #[test]
    fn delivery_error_display_timeout() {
        let err = DeliveryError::TimedOut(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Publish timed out after 5s");
    }

    #[test]
    fn delivery_error_wraps_transport() {
        let err = DeliveryError::from(QueueError::Transport("connection reset".into()));
        assert_eq!(err.to_string(), "Broker transport error: connection reset");
    }
}
