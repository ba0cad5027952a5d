//! Shared scheduling resource for immediate and delayed watch tasks.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// The pool of worker slots every multiplexer schedules its state-machine
/// steps on.
///
/// One scheduler is created at process startup, shared by reference across
/// all downstream connections, and shut down exactly once at teardown. Every
/// task it runs is cancellation-gated, so shutdown ends pending and delayed
/// work promptly; tasks handed in after shutdown are dropped.
#[derive(Debug, Default)]
pub struct WatchScheduler {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl WatchScheduler {
    /// Create a fresh scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `task` as an independent unit of work.
    ///
    /// Dropped silently once the scheduler is shut down.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.token.is_cancelled() {
            debug!("scheduler is shut down, dropping task");
            return;
        }
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = task => {}
            }
        });
    }

    /// Run `task` after `delay`.
    ///
    /// The delay is cancelled by shutdown like any other task.
    pub fn spawn_after<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }

    /// Stop accepting work, cancel everything in flight, and wait for
    /// quiescence.
    ///
    /// Called once during orderly process teardown.
    pub async fn shutdown(&self) {
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
