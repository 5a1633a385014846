//! Click handling for shown notifications.
//!
//! Surfaces report activated actions on an `mpsc` channel. A dedicated
//! listener task drains it and opens the application URL, so a slow or
//! missing browser never holds up queue consumption.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::NotifyError;
use crate::surface::ActionInvoked;

/// Action key sent when the notification body itself is clicked.
pub const ACTION_DEFAULT: &str = "default";

/// Opens a URL for the user.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), NotifyError>;
}

/// Opens URLs with the platform's default handler.
///
/// The launcher is started and not waited on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUrlOpener;

#[async_trait]
impl UrlOpener for SystemUrlOpener {
    async fn open(&self, url: &str) -> Result<(), NotifyError> {
        let mut command = if cfg!(target_os = "windows") {
            let mut c = tokio::process::Command::new("rundll32");
            c.arg("url.dll,FileProtocolHandler");
            c
        } else if cfg!(target_os = "macos") {
            tokio::process::Command::new("open")
        } else {
            tokio::process::Command::new("xdg-open")
        };

        command
            .arg(url)
            .spawn()
            .map(drop)
            .map_err(|e| NotifyError::Open(e.to_string()))
    }
}

/// Open `app_url` for every `default` action until the channel closes.
///
/// Other action keys (including the close signal some servers send) are
/// ignored.
pub async fn run_action_listener<O: UrlOpener>(
    mut actions: mpsc::Receiver<ActionInvoked>,
    opener: O,
    app_url: String,
) {
    while let Some(invoked) = actions.recv().await {
        if invoked.action_key != ACTION_DEFAULT {
            tracing::debug!(
                notification_id = invoked.notification_id,
                action_key = %invoked.action_key,
                "Ignoring notification action"
            );
            continue;
        }

        tracing::info!(notification_id = invoked.notification_id, url = %app_url, "Notification clicked, opening application");
        if let Err(e) = opener.open(&app_url).await {
            tracing::warn!(error = %e, "Failed to open application URL");
        }
    }

    tracing::debug!("Action listener stopped");
}
