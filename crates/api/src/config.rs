use ordercast_events::queue::parse_var;
use ordercast_events::{QueueConfig, DEFAULT_MAILBOX_CAPACITY};

pub use ordercast_events::ConfigError;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Pending messages per WebSocket session before it is dropped
    /// (default: `256`).
    pub mailbox_capacity: usize,
    /// Broker settings for the queue publisher.
    pub queue: QueueConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `WS_MAILBOX_CAPACITY`  | `256`                      |
    ///
    /// Queue settings are read by [`QueueConfig::from_env`]. A variable that
    /// is set but does not parse is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port = parse_var("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30)?;
        let mailbox_capacity = parse_var("WS_MAILBOX_CAPACITY", DEFAULT_MAILBOX_CAPACITY)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            mailbox_capacity,
            queue: QueueConfig::from_env()?,
        })
    }
}
