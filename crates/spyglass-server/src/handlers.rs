//! HTTP request handlers for the dashboard API.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use spyglass_watch::KindInfo;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::state::DashboardState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current server time.
    pub timestamp: DateTime<Utc>,
}

/// Handle GET /api/health - health check endpoint.
pub async fn health_check(State(state): State<Arc<DashboardState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
        timestamp: Utc::now(),
    })
}

/// Handle GET /api/kinds - list the watchable resource kinds.
pub async fn list_kinds(State(state): State<Arc<DashboardState>>) -> Json<Vec<KindInfo>> {
    Json(state.hub().kinds())
}

/// Handle GET /api/watch - the aggregated watch stream via SSE.
///
/// One connection gets one independent multiplexer; the stream stays open
/// until the client disconnects or the process shuts down.
pub async fn watch_events(
    State(state): State<Arc<DashboardState>>,
) -> DashboardResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let guard = state.try_acquire_watch_slot().ok_or_else(|| {
        DashboardError::TooManyConnections(
            state.watch_connection_count(),
            state.config().max_watch_connections,
        )
    })?;
    let events = state.hub().new_watch()?;
    debug!("watch connection opened");

    let stream = events.filter_map(move |event| {
        // The slot is released when the client goes away and the stream is
        // dropped.
        let _hold = &guard;
        match serde_json::to_string(&event) {
            Ok(data) => Some(Ok::<Event, Infallible>(Event::default().data(data))),
            Err(e) => {
                warn!(error = %e, "Failed to serialize watch event");
                None
            }
        }
    });

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(state.config().keep_alive_interval)))
}
