use std::time::Duration;

use crate::queue::config::QueueConfig;

/// Linear reconnect backoff: after failed attempt `n` the consumer waits
/// `n * step` before trying again, for at most `max_attempts` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    step: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, step: Duration) -> Self {
        Self { max_attempts, step }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.reconnect_max_attempts, config.reconnect_backoff)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}
