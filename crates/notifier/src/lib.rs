//! Desktop notifications for new orders.
//!
//! The notifier consumes [`OrderNotification`](ordercast_events::OrderNotification)s
//! from the durable queue and turns the ones worth a user's attention into
//! desktop notifications:
//!
//! - [`NotificationSink`] -- the queue [`MessageHandler`](ordercast_events::MessageHandler):
//!   parses, filters with [`should_notify`] and renders a [`DesktopNotification`].
//! - [`NotificationSurface`] -- where notifications are shown. The freedesktop
//!   surface is compiled in with the `desktop-notifications` feature; otherwise
//!   [`LoggingSurface`] is used.
//! - [`run_action_listener`] -- opens the application URL when the user
//!   clicks a notification.

pub mod callback;
pub mod config;
#[cfg(all(feature = "desktop-notifications", target_os = "linux"))]
pub mod desktop;
pub mod error;
pub mod sink;
pub mod surface;

pub use callback::{run_action_listener, SystemUrlOpener, UrlOpener, ACTION_DEFAULT};
pub use config::NotifierConfig;
pub use error::NotifyError;
pub use sink::{should_notify, NotificationSink};
pub use surface::{ActionInvoked, DesktopNotification, LoggingSurface, NotificationSurface, Urgency};
