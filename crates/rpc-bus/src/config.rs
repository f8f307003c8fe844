//! Session and logging configuration from environment variables.

use rpc_types::MessageKind;
use std::env;
use std::time::Duration;

/// Default time a request waits for its response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of inbound frames queued before back-pressure is logged.
pub const DEFAULT_INBOUND_CAPACITY: usize = 256;

/// Configuration for one RPC session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application name, attached to session log events
    pub app_name: String,

    /// How long `request` waits before failing with `Timeout`
    pub request_timeout: Duration,

    /// Inbound frames queued before the sink reports back-pressure
    pub inbound_capacity: usize,

    /// Notification kind whose command id selects a command handler
    pub command_kind: MessageKind,

    /// Parameter key holding the command id
    pub command_id_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_name: "rpc-app".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            command_kind: MessageKind::ON_COMMAND,
            command_id_key: "cmdID".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RPC_APP_NAME`: Application name (default: rpc-app)
    /// - `RPC_REQUEST_TIMEOUT_MS`: Request timeout in milliseconds (default: 10000)
    /// - `RPC_INBOUND_CAPACITY`: Inbound queue capacity (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            app_name: env::var("RPC_APP_NAME").unwrap_or(defaults.app_name),

            request_timeout: env::var("RPC_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),

            inbound_capacity: env::var("RPC_INBOUND_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.inbound_capacity),

            ..defaults
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for the log subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directives (trace, debug, info, warn, error, or `target=level` lists)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LoggingConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RPC_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `RPC_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("RPC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("RPC_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.command_kind, MessageKind::ON_COMMAND);
        assert_eq!(config.command_id_key, "cmdID");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::default()
            .with_app_name("navigator")
            .with_request_timeout(Duration::from_millis(50));
        assert_eq!(config.app_name, "navigator");
        assert_eq!(config.request_timeout, Duration::from_millis(50));
    }
}
