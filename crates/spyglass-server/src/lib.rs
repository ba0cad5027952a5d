//! # spyglass-server
//!
//! REST and server-push API for the Spyglass cluster dashboard.
//!
//! This crate provides the HTTP surface over the watch engine in
//! `spyglass-watch`: a small REST API plus one aggregated Server-Sent Events
//! stream per client connection, built on the axum HTTP framework.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use spyglass_server::{DashboardConfig, DashboardServer};
//! use spyglass_watch::{KindRegistry, WatchHub, WatchScheduler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scheduler = Arc::new(WatchScheduler::new());
//!     // Register one KindSpec per resource kind here.
//!     let kinds = KindRegistry::new().into_watchables();
//!     let hub = Arc::new(WatchHub::new(scheduler, kinds));
//!
//!     let config = DashboardConfig::default();
//!     let addr = config.bind_addr;
//!     let server = DashboardServer::new(config, hub);
//!     server.serve(addr).await.expect("server failed");
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/health` | GET | Liveness check with uptime |
//! | `/api/kinds` | GET | Watchable resource kinds and their policies |
//! | `/api/watch` | GET | Aggregated watch stream (SSE), one multiplexer per connection |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use server::DashboardServer;
pub use state::DashboardState;
