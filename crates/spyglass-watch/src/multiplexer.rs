//! Self-healing multiplexer: fans N independent per-kind subscriptions into
//! one downstream sink, healing each on failure without ever letting one
//! kind's trouble end the aggregate stream.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;

use crate::availability::AvailabilityCache;
use crate::event::{RestartNotice, WatchEvent};
use crate::scheduler::WatchScheduler;
use crate::subscriber::{CloseHandler, EventSink, WatchHandle};
use crate::watchable::Watchable;

/// Per-connection orchestrator over a fixed list of [`Watchable`]s.
///
/// Each Watchable runs its own conceptual state machine, dispatched as
/// independent scheduled tasks so one kind's slow availability probe never
/// blocks another's progression. All live subscriptions feed the same sink.
/// At most one live handle exists per kind at any instant: a resubscribe
/// closes the prior handle before installing the new one.
///
/// Only downstream cancellation (or the process-wide scheduler shutdown)
/// ends the aggregate stream.
pub struct SelfHealingMultiplexer {
    scheduler: Arc<WatchScheduler>,
    watchables: Vec<Arc<dyn Watchable>>,
    availability: AvailabilityCache,
    active: Mutex<HashMap<String, WatchHandle>>,
    sink: EventSink,
}

impl SelfHealingMultiplexer {
    /// Create a multiplexer bound to one downstream sink.
    #[must_use]
    pub fn new(
        scheduler: Arc<WatchScheduler>,
        watchables: Vec<Arc<dyn Watchable>>,
        availability: AvailabilityCache,
        sink: EventSink,
    ) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            watchables,
            availability,
            active: Mutex::new(HashMap::new()),
            sink,
        })
    }

    /// Schedule one independent subscribe attempt per Watchable and register
    /// the downstream-termination cleanup.
    pub fn start(self: Arc<Self>) {
        for watchable in &self.watchables {
            let mux = Arc::clone(&self);
            let watchable = Arc::clone(watchable);
            self.scheduler.spawn(async move {
                mux.subscribe(watchable).await;
            });
        }

        let mux = Arc::clone(&self);
        self.scheduler.spawn(async move {
            mux.sink.cancelled().await;
            debug!("downstream cancelled, closing all active watches");
            mux.close_all();
        });
    }

    /// One subscribe attempt for one Watchable.
    ///
    /// Closes any previous handle for the kind first, then either starts a
    /// new subscription or schedules a later re-attempt, re-checking
    /// downstream cancellation before every step.
    async fn subscribe(self: Arc<Self>, watchable: Arc<dyn Watchable>) {
        self.close_previous(watchable.type_name());
        if self.sink.is_cancelled() {
            return;
        }

        if self.availability.is_available(watchable.as_ref()).await {
            // The probe may have taken a while; cancellation can race it.
            if self.sink.is_cancelled() {
                return;
            }
            let on_close = Arc::clone(&self).heal_handler(Arc::clone(&watchable));
            match watchable.watch() {
                Ok(subscriber) => {
                    let handle = subscriber.subscribe(on_close, self.sink.clone());
                    self.install(watchable.type_name(), handle);
                }
                // An attempt that fails before going live heals like a dying
                // subscription.
                Err(cause) => on_close(Err(cause)),
            }
        } else if !self.sink.is_cancelled() {
            debug!(
                kind = watchable.type_name(),
                delay_secs = watchable.retry_subscription_delay().as_secs(),
                "kind is not available, retrying"
            );
            let mux = Arc::clone(&self);
            let next = Arc::clone(&watchable);
            self.scheduler
                .spawn_after(watchable.retry_subscription_delay(), mux.subscribe_task(next));
        }
    }

    /// Box one subscribe attempt as an explicitly-`Send` future.
    ///
    /// `subscribe` schedules itself recursively via the scheduler, whose task
    /// bound requires `Send`; routing the recursive call through a declared
    /// `BoxFuture` return type breaks the self-referential auto-trait inference
    /// that the direct `async` recursion would otherwise leave unresolved.
    fn subscribe_task(self: Arc<Self>, watchable: Arc<dyn Watchable>) -> BoxFuture<'static, ()> {
        Box::pin(self.subscribe(watchable))
    }

    /// Close callback for one live handle: emit a restart notice and schedule
    /// the resubscribe, unless the downstream is gone or the kind opted out.
    fn heal_handler(self: Arc<Self>, watchable: Arc<dyn Watchable>) -> CloseHandler {
        let mux = self;
        Box::new(move |reason| {
            if mux.sink.is_cancelled() {
                debug!(kind = watchable.type_name(), "watch stopped");
                return;
            }
            if !watchable.retry_subscription() {
                debug!(
                    kind = watchable.type_name(),
                    "watch stopped, kind opted out of retries"
                );
                return;
            }
            debug!(
                kind = watchable.type_name(),
                delay_secs = watchable.self_healing_delay().as_secs(),
                "watch stopped, self healing"
            );
            let notice = RestartNotice::new(watchable.type_name(), reason.err().as_ref());
            mux.sink.emit(WatchEvent::restart_notice(&notice));

            let next = Arc::clone(&watchable);
            let rescheduled = Arc::clone(&mux);
            mux.scheduler
                .spawn_after(watchable.self_healing_delay(), async move {
                    rescheduled.subscribe(next).await;
                });
        })
    }

    /// Atomically replace the active handle for `kind`, closing any handle
    /// that was still installed.
    fn install(&self, kind: &str, handle: WatchHandle) {
        let mut active = self.active.lock();
        if let Some(previous) = active.insert(kind.to_owned(), handle) {
            previous.close();
        }
    }

    fn close_previous(&self, kind: &str) {
        let previous = self.active.lock().remove(kind);
        if let Some(previous) = previous {
            debug!(kind, "cancelling previous subscription");
            previous.close();
        }
    }

    /// Snapshot-then-close every active handle. Safe to call repeatedly and
    /// while individual Watchables are mid-transition.
    fn close_all(&self) {
        let handles: Vec<WatchHandle> = {
            let mut active = self.active.lock();
            active.drain().map(|(_, handle)| handle).collect()
        };
        for handle in &handles {
            handle.close();
        }
    }
}
