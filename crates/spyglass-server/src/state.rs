//! Shared state for the dashboard server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use spyglass_watch::WatchHub;

use crate::config::DashboardConfig;

/// Shared state for the dashboard server.
pub struct DashboardState {
    /// Dashboard configuration.
    config: DashboardConfig,
    /// The watch aggregation hub, shared for the process lifetime.
    hub: Arc<WatchHub>,
    /// Number of active watch (SSE) connections.
    watch_connections: Arc<AtomicUsize>,
    /// Server start time.
    start_time: Instant,
    /// Wall-clock start timestamp.
    started_at: DateTime<Utc>,
}

impl DashboardState {
    /// Create a new dashboard state.
    #[must_use]
    pub fn new(config: DashboardConfig, hub: Arc<WatchHub>) -> Self {
        Self {
            config,
            hub,
            watch_connections: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Get the watch hub.
    #[must_use]
    pub fn hub(&self) -> &Arc<WatchHub> {
        &self.hub
    }

    /// Get the number of active watch connections.
    #[must_use]
    pub fn watch_connection_count(&self) -> usize {
        self.watch_connections.load(Ordering::Relaxed)
    }

    /// Reserve a watch connection slot.
    ///
    /// Returns `None` when the connection limit has been reached. The slot is
    /// released when the returned guard is dropped, i.e. when the client
    /// disconnects.
    #[must_use]
    pub fn try_acquire_watch_slot(&self) -> Option<WatchConnectionGuard> {
        let current = self.watch_connections.fetch_add(1, Ordering::Relaxed);
        if current >= self.config.max_watch_connections {
            self.watch_connections.fetch_sub(1, Ordering::Relaxed);
            return None;
        }
        Some(WatchConnectionGuard {
            connections: Arc::clone(&self.watch_connections),
        })
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get the wall-clock start timestamp.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Releases one watch connection slot on drop.
pub struct WatchConnectionGuard {
    connections: Arc<AtomicUsize>,
}

impl Drop for WatchConnectionGuard {
    fn drop(&mut self) {
        self.connections.fetch_sub(1, Ordering::Relaxed);
    }
}
