//! Dashboard server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use spyglass_watch::WatchHub;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::routes::create_router;
use crate::state::DashboardState;

/// Dashboard server for the web UI API.
///
/// Provides the REST endpoints plus the aggregated SSE watch stream, bound to
/// one [`WatchHub`] for the process lifetime.
#[derive(Clone)]
pub struct DashboardServer {
    state: Arc<DashboardState>,
}

impl DashboardServer {
    /// Create a new dashboard server over the shared watch hub.
    #[must_use]
    pub fn new(config: DashboardConfig, hub: Arc<WatchHub>) -> Self {
        let state = Arc::new(DashboardState::new(config, hub));
        Self { state }
    }

    /// Get the dashboard state for external access.
    #[must_use]
    pub fn state(&self) -> Arc<DashboardState> {
        Arc::clone(&self.state)
    }

    /// Get the watch hub.
    #[must_use]
    pub fn hub(&self) -> Arc<WatchHub> {
        Arc::clone(self.state.hub())
    }

    /// Create the router without starting the server.
    ///
    /// Useful for testing or embedding in another server.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }

    /// Start the dashboard server and listen for connections.
    ///
    /// This method runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self, addr: SocketAddr) -> DashboardResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DashboardError::BindFailed(addr, e))?;

        info!(addr = %addr, "Dashboard server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| DashboardError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Start the dashboard server with graceful shutdown support.
    ///
    /// The server shuts down when the provided future completes; the watch
    /// hub's scheduler is then shut down, so subsequent watch attempts fail
    /// fast. Call once during orderly process teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> DashboardResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DashboardError::BindFailed(addr, e))?;

        info!(addr = %addr, "Dashboard server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DashboardError::Internal(e.to_string()))?;

        self.state.hub().shutdown().await;
        info!("Dashboard server shut down");
        Ok(())
    }
}
