//! Freedesktop notifications over D-Bus via `notify-rust`.

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};
use tokio::sync::mpsc;

use crate::error::NotifyError;
use crate::surface::{ActionInvoked, DesktopNotification, NotificationSurface, Urgency};

/// Shows notifications on the session bus and reports clicked actions.
pub struct DesktopSurface {
    actions: mpsc::Sender<ActionInvoked>,
}

impl DesktopSurface {
    /// `actions` receives one [`ActionInvoked`] per activated action.
    pub fn new(actions: mpsc::Sender<ActionInvoked>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl NotificationSurface for DesktopSurface {
    async fn show(&self, notification: DesktopNotification) -> Result<u32, NotifyError> {
        let mut builder = Notification::new();
        builder
            .appname(&notification.app_name)
            .summary(&notification.title)
            .body(&notification.body)
            .urgency(match notification.urgency {
                Urgency::Low => notify_rust::Urgency::Low,
                Urgency::Normal => notify_rust::Urgency::Normal,
                Urgency::Critical => notify_rust::Urgency::Critical,
            })
            .timeout(Timeout::Milliseconds(notification.timeout_ms));
        if !notification.icon.is_empty() {
            builder.icon(&notification.icon);
        }
        for (key, label) in &notification.actions {
            builder.action(key, label);
        }

        // D-Bus calls block; keep them off the runtime threads.
        let handle = tokio::task::spawn_blocking(move || builder.show())
            .await
            .map_err(|e| NotifyError::Surface(e.to_string()))?
            .map_err(|e| NotifyError::Surface(e.to_string()))?;

        let notification_id = handle.id();
        let actions = self.actions.clone();

        // Runs until the notification is activated or closed.
        tokio::task::spawn_blocking(move || {
            handle.wait_for_action(|action_key| {
                let invoked = ActionInvoked {
                    notification_id,
                    action_key: action_key.to_string(),
                };
                if actions.blocking_send(invoked).is_err() {
                    tracing::debug!(notification_id, "Action listener gone, dropping action");
                }
            });
        });

        Ok(notification_id)
    }
}
