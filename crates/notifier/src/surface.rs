//! Notification model and the surfaces that display it.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::error::NotifyError;

/// Urgency hint passed to the notification server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

/// A notification ready to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct DesktopNotification {
    pub app_name: String,
    pub icon: String,
    pub title: String,
    pub body: String,
    /// `(action_key, label)` pairs; `"default"` is the click action.
    pub actions: Vec<(String, String)>,
    pub urgency: Urgency,
    pub timeout_ms: u32,
}

/// Reported by a surface when the user activates a notification action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvoked {
    pub notification_id: u32,
    pub action_key: String,
}

/// Somewhere notifications can be shown.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Show `notification` and return the id assigned to it.
    async fn show(&self, notification: DesktopNotification) -> Result<u32, NotifyError>;
}

/// Writes notifications to the log instead of a desktop.
///
/// Used when the notifier is built without desktop support or runs on a
/// host without a notification server. Never reports actions.
#[derive(Debug, Default)]
pub struct LoggingSurface {
    next_id: AtomicU32,
}

impl LoggingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationSurface for LoggingSurface {
    async fn show(&self, notification: DesktopNotification) -> Result<u32, NotifyError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            notification_id = id,
            app_name = %notification.app_name,
            title = %notification.title,
            body = %notification.body,
            "Notification"
        );
        Ok(id)
    }
}
