//! Process-wide watch aggregation service.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::availability::{AvailabilityCache, DEFAULT_CHECK_INTERVAL};
use crate::error::{WatchError, WatchResult};
use crate::event::WatchEvent;
use crate::multiplexer::SelfHealingMultiplexer;
use crate::scheduler::WatchScheduler;
use crate::subscriber::EventSink;
use crate::watchable::Watchable;

/// Owns the full set of Watchable adapters and the shared scheduler for the
/// process lifetime, and hands each downstream connection one composed
/// stream.
///
/// Every connection gets an independent multiplexer (independent
/// per-Watchable state); all of them share the scheduler, so scheduler
/// pressure affects latency, not correctness.
pub struct WatchHub {
    scheduler: Arc<WatchScheduler>,
    watchables: Vec<Arc<dyn Watchable>>,
    availability_interval: Duration,
}

impl WatchHub {
    /// Create a hub over a statically assembled adapter list.
    #[must_use]
    pub fn new(scheduler: Arc<WatchScheduler>, watchables: Vec<Arc<dyn Watchable>>) -> Self {
        Self {
            scheduler,
            watchables,
            availability_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Override the availability refresh interval used by new connections.
    #[must_use]
    pub fn with_availability_interval(mut self, interval: Duration) -> Self {
        self.availability_interval = interval;
        self
    }

    /// Descriptors of every registered kind, for the REST surface.
    #[must_use]
    pub fn kinds(&self) -> Vec<KindInfo> {
        self.watchables
            .iter()
            .map(|watchable| KindInfo {
                name: watchable.type_name().to_owned(),
                retry_subscription: watchable.retry_subscription(),
                availability_gated: watchable.availability_check().is_some(),
            })
            .collect()
    }

    /// Open one aggregated event stream for one downstream connection.
    ///
    /// # Errors
    ///
    /// Fails fast with [`WatchError::SchedulerShutdown`] once the shared
    /// scheduler has been shut down.
    pub fn new_watch(&self) -> WatchResult<WatchStream> {
        if self.scheduler.is_shutdown() {
            return Err(WatchError::SchedulerShutdown);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let multiplexer = SelfHealingMultiplexer::new(
            Arc::clone(&self.scheduler),
            self.watchables.clone(),
            AvailabilityCache::with_interval(self.availability_interval),
            EventSink::new(tx),
        );
        multiplexer.start();
        Ok(WatchStream {
            inner: UnboundedReceiverStream::new(rx),
        })
    }

    /// Shut the shared scheduler down.
    ///
    /// Called once during orderly process teardown; afterwards
    /// [`new_watch`](Self::new_watch) fails fast.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

/// The aggregated event stream handed to one downstream connection.
///
/// Ends only when the multiplexer behind it is torn down; dropping it cancels
/// the connection's subscriptions.
pub struct WatchStream {
    inner: UnboundedReceiverStream<WatchEvent>,
}

impl Stream for WatchStream {
    type Item = WatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Descriptor of one registered kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindInfo {
    /// Display name of the kind.
    pub name: String,
    /// Whether a dead subscription for this kind is retried.
    pub retry_subscription: bool,
    /// Whether subscription attempts are gated by an availability probe.
    pub availability_gated: bool,
}
