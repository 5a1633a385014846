//! Queue handler that turns order notifications into desktop notifications.

use std::sync::Arc;

use async_trait::async_trait;
use ordercast_core::OrderStatus;
use ordercast_events::{MessageHandler, OrderNotification};

use crate::callback::ACTION_DEFAULT;
use crate::config::NotifierConfig;
use crate::error::NotifyError;
use crate::surface::{DesktopNotification, NotificationSurface, Urgency};

const TITLE_NEW_ORDER: &str = "New order";
const ACTION_OPEN_LABEL: &str = "Open";

/// Whether an order event deserves a desktop notification.
///
/// Only newly placed orders do; status changes are left to the live UI.
pub fn should_notify(notification: &OrderNotification) -> bool {
    notification.status == OrderStatus::New
}

/// Renders order notifications onto a [`NotificationSurface`].
pub struct NotificationSink {
    surface: Arc<dyn NotificationSurface>,
    app_name: String,
    icon: String,
    timeout_ms: u32,
}

impl NotificationSink {
    pub fn new(surface: Arc<dyn NotificationSurface>, config: &NotifierConfig) -> Self {
        Self {
            surface,
            app_name: config.app_name.clone(),
            icon: config.icon.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    /// Build the notification shown for a new order.
    pub fn render(&self, notification: &OrderNotification) -> DesktopNotification {
        DesktopNotification {
            app_name: self.app_name.clone(),
            icon: self.icon.clone(),
            title: TITLE_NEW_ORDER.to_string(),
            body: format!(
                "Order #{}\nCustomer: {}\nTotal: {:.2}",
                notification.order_id, notification.customer_name, notification.total_amount
            ),
            actions: vec![(ACTION_DEFAULT.to_string(), ACTION_OPEN_LABEL.to_string())],
            urgency: Urgency::Normal,
            timeout_ms: self.timeout_ms,
        }
    }

    /// Parse one payload and show a notification if it qualifies.
    ///
    /// Returns the id of the shown notification, or `None` when the event
    /// was filtered out.
    pub async fn process(&self, payload: &[u8]) -> Result<Option<u32>, NotifyError> {
        let notification: OrderNotification = serde_json::from_slice(payload)?;

        tracing::info!(
            order_id = notification.order_id,
            status = %notification.status.label(),
            "Processing order notification"
        );

        if !should_notify(&notification) {
            tracing::debug!(
                order_id = notification.order_id,
                status = %notification.status,
                "Skipping notification, only new orders notify"
            );
            return Ok(None);
        }

        let id = self.surface.show(self.render(&notification)).await?;
        tracing::info!(order_id = notification.order_id, notification_id = id, "Notification shown");
        Ok(Some(id))
    }
}

#[async_trait]
impl MessageHandler for NotificationSink {
    type Error = NotifyError;

    async fn handle(&self, payload: &[u8]) -> Result<(), NotifyError> {
        self.process(payload).await.map(drop)
    }
}
