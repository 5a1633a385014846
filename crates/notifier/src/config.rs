use ordercast_events::queue::parse_var;
use ordercast_events::QueueConfig;

pub use ordercast_events::ConfigError;

const DEFAULT_APP_URL: &str = "http://localhost";
const DEFAULT_APP_NAME: &str = "Order Management System";
const DEFAULT_TIMEOUT_MS: u32 = 5000;

/// Notifier configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Opened when the user clicks a notification.
    pub app_url: String,
    /// Application name reported to the notification server.
    pub app_name: String,
    /// Icon name or path; empty means the server default.
    pub icon: String,
    /// How long a notification stays visible.
    pub timeout_ms: u32,
    /// Broker settings for the queue consumer.
    pub queue: QueueConfig,
}

impl NotifierConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var             | Default                   |
    /// |---------------------|---------------------------|
    /// | `APP_URL`           | `http://localhost`        |
    /// | `NOTIFY_APP_NAME`   | `Order Management System` |
    /// | `NOTIFY_ICON`       | (empty)                   |
    /// | `NOTIFY_TIMEOUT_MS` | `5000`                    |
    ///
    /// Queue settings are read by [`QueueConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| DEFAULT_APP_URL.into()),
            app_name: std::env::var("NOTIFY_APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.into()),
            icon: std::env::var("NOTIFY_ICON").unwrap_or_default(),
            timeout_ms: parse_var("NOTIFY_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            queue: QueueConfig::from_env()?,
        })
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.into(),
            app_name: DEFAULT_APP_NAME.into(),
            icon: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            queue: QueueConfig::default(),
        }
    }
}
