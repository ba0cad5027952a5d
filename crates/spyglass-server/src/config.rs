//! Dashboard server configuration.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the dashboard server.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent watch (SSE) connections allowed.
    pub max_watch_connections: usize,
    /// Keep-alive interval for the SSE stream.
    pub keep_alive_interval: Duration,
    /// CORS allowed origins (empty means all).
    pub cors_origins: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_watch_connections: 100,
            keep_alive_interval: Duration::from_secs(15),
            cors_origins: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Set the maximum concurrent watch connections.
    #[must_use]
    pub const fn with_max_watch_connections(mut self, max: usize) -> Self {
        self.max_watch_connections = max;
        self
    }

    /// Set the SSE keep-alive interval.
    #[must_use]
    pub const fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Add a CORS allowed origin.
    #[must_use]
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origins.push(origin.into());
        self
    }
}
