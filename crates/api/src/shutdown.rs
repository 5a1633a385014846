//! Post-shutdown helpers for background tasks.

use std::time::Duration;

use tokio::task::JoinHandle;

/// How a background task ended while the server was shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    Finished,
    /// The task panicked or was aborted.
    Failed,
    /// Still running after the grace period; left detached.
    TimedOut,
}

/// Wait up to `grace` for `task` to finish and log the outcome.
pub async fn join_with_grace(name: &str, task: JoinHandle<()>, grace: Duration) -> TaskExit {
    match tokio::time::timeout(grace, task).await {
        Ok(Ok(())) => {
            tracing::info!(task = name, "Background task stopped");
            TaskExit::Finished
        }
        Ok(Err(e)) => {
            tracing::error!(task = name, error = %e, "Background task failed");
            TaskExit::Failed
        }
        Err(_) => {
            tracing::warn!(task = name, grace_secs = grace.as_secs(), "Background task did not stop in time");
            TaskExit::TimedOut
        }
    }
}
