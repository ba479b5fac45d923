//! Client configuration.

use std::time::Duration;

use murmur_core::SessionConfig;

/// Persistent connection endpoint used when none is given.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5000/ws";

/// History endpoint used when none is given.
pub const DEFAULT_HISTORY_URL: &str = "http://127.0.0.1:5000/api/messages";

/// Upper bound on the one-shot history request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between `Tick` events fed to the session.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the chat service.
    pub server_url: String,
    /// URL returning the JSON message history.
    pub history_url: String,
    /// History request timeout. Expiry degrades to a live-only transcript.
    pub request_timeout: Duration,
    /// Tick period driving handshake timeout checks.
    pub tick_interval: Duration,
    /// Core session settings.
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            history_url: DEFAULT_HISTORY_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            session: SessionConfig::default(),
        }
    }
}
