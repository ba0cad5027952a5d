//! # spyglass-watch
//!
//! Watch aggregation and self-healing subscription engine for the Spyglass
//! cluster dashboard.
//!
//! The engine takes an arbitrary number of independent, heterogeneous
//! "watch this resource kind" subscriptions — each of which can fail,
//! complete, or be permanently unsupported by the target cluster — and
//! multiplexes them into one self-repairing event stream per downstream
//! connection. A dead or unavailable kind never terminates the aggregate
//! stream; only downstream cancellation or process shutdown does.
//!
//! ## Building blocks
//!
//! - [`Watchable`] — the contract each resource-kind adapter implements
//! - [`Subscriber`] / [`WatchHandle`] — the bridge between one underlying
//!   watch connection and the shared [`EventSink`]
//! - [`AvailabilityCache`] — TTL-memoized "can this kind be watched" probes
//! - [`SelfHealingMultiplexer`] — per-connection orchestrator healing each
//!   subscription independently with backoff
//! - [`WatchHub`] — process-wide service minting one aggregated stream per
//!   downstream connection
//! - [`KindRegistry`] / [`KindSpec`] — declarative table of watchable kinds
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use spyglass_watch::{
//!     FixedSubscriber, KindRegistry, KindSpec, Subscriber, WatchHub, WatchScheduler,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let scheduler = Arc::new(WatchScheduler::new());
//!     let kinds = KindRegistry::new()
//!         .register(KindSpec::new(
//!             "ConfigMap",
//!             Arc::new(|| Ok(Box::new(FixedSubscriber::empty()) as Box<dyn Subscriber>)),
//!         ))
//!         .into_watchables();
//!
//!     let hub = WatchHub::new(Arc::clone(&scheduler), kinds);
//!     let _stream = hub.new_watch().expect("hub accepts watches");
//!
//!     // At process teardown, exactly once:
//!     hub.shutdown().await;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod availability;
pub mod error;
pub mod event;
pub mod hub;
pub mod multiplexer;
pub mod registry;
pub mod scheduler;
pub mod subscriber;
pub mod watchable;

// Re-export main types
pub use availability::{AvailabilityCache, DEFAULT_CHECK_INTERVAL};
pub use error::{WatchError, WatchResult};
pub use event::{RestartNotice, WatchAction, WatchEvent};
pub use hub::{KindInfo, WatchHub, WatchStream};
pub use multiplexer::SelfHealingMultiplexer;
pub use registry::{KindRegistry, KindSpec, SubscriberFactory};
pub use scheduler::WatchScheduler;
pub use subscriber::{
    CloseHandler, ConnectFn, EventSink, FixedSubscriber, StreamSubscriber, Subscriber,
    WatchHandle, WATCH_TIMEOUT,
};
pub use watchable::{
    AvailabilityCheck, Watchable, DEFAULT_RETRY_SUBSCRIPTION_DELAY, DEFAULT_SELF_HEALING_DELAY,
};
