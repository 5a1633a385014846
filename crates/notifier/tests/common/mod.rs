#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ordercast_notifier::{DesktopNotification, NotificationSurface, NotifyError, UrlOpener};

/// Surface that records every notification it is asked to show.
#[derive(Default)]
pub struct RecordingSurface {
    pub shown: Mutex<Vec<DesktopNotification>>,
    pub fail: bool,
}

impl RecordingSurface {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn shown(&self) -> Vec<DesktopNotification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSurface for RecordingSurface {
    async fn show(&self, notification: DesktopNotification) -> Result<u32, NotifyError> {
        if self.fail {
            return Err(NotifyError::Surface("notification server unavailable".into()));
        }
        let mut shown = self.shown.lock().unwrap();
        shown.push(notification);
        Ok(shown.len() as u32)
    }
}

/// Opener that records URLs instead of launching anything.
#[derive(Clone, Default)]
pub struct RecordingOpener {
    pub opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlOpener for RecordingOpener {
    async fn open(&self, url: &str) -> Result<(), NotifyError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// JSON payload as published by the API for one order event.
pub fn payload(order_id: i64, status: &str) -> Vec<u8> {
    serde_json::json!({
        "order_id": order_id,
        "customer_name": "Jan Kowalski",
        "status": status,
        "total_amount": 149.5,
        "timestamp": "2025-03-01T12:00:00Z"
    })
    .to_string()
    .into_bytes()
}
