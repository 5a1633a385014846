/// Failure while turning a queue delivery into a notification.
///
/// Every variant fails the handler run, so the delivery is requeued.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The payload is not a valid `OrderNotification`.
    #[error("Invalid notification payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The notification surface refused or failed to show the notification.
    #[error("Notification surface error: {0}")]
    Surface(String),

    /// The platform URL opener could not be started.
    #[error("Failed to open URL: {0}")]
    Open(String),
}
