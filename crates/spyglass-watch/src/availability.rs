//! TTL-memoized availability checks, keyed by kind name.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::watchable::Watchable;

/// How long a probe result stays fresh before the next query re-checks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
struct AvailabilityRecord {
    checked_at: Instant,
    available: bool,
}

/// Per-kind memoized "can this kind be watched right now" answers.
///
/// Exists purely to avoid issuing an availability probe on every retry tick
/// when retries are frequent. Shared across all subscribe attempts of one
/// multiplexer. Overlapping refreshes for the same kind are last-writer-wins;
/// staleness only affects polling frequency, not correctness.
#[derive(Debug)]
pub struct AvailabilityCache {
    interval: Duration,
    records: Mutex<HashMap<String, AvailabilityRecord>>,
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityCache {
    /// Create a cache with the default refresh interval.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_CHECK_INTERVAL)
    }

    /// Create a cache with a custom refresh interval.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `watchable` can currently be watched.
    ///
    /// A kind without an availability check is always available and no record
    /// is kept for it. Otherwise the cached record is returned until it goes
    /// stale, at which point the probe runs again; a probe failure is treated
    /// as "not available".
    pub async fn is_available(&self, watchable: &dyn Watchable) -> bool {
        let Some(check) = watchable.availability_check() else {
            return true;
        };
        let kind = watchable.type_name();

        if let Some(record) = self.records.lock().get(kind) {
            if record.checked_at.elapsed() < self.interval {
                return record.available;
            }
        }

        // Probe outside the lock; it may block on network I/O.
        let available = match check().await {
            Ok(available) => available,
            Err(cause) => {
                debug!(kind, error = %cause, "availability probe failed, treating as unavailable");
                false
            }
        };
        self.records.lock().insert(
            kind.to_owned(),
            AvailabilityRecord {
                checked_at: Instant::now(),
                available,
            },
        );
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatchError;
    use crate::subscriber::{FixedSubscriber, Subscriber};
    use crate::watchable::AvailabilityCheck;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ProbedWatchable {
        probe_count: Arc<AtomicUsize>,
        check: Option<AvailabilityCheck>,
    }

    impl ProbedWatchable {
        fn new(result: Result<bool, ()>) -> Self {
            let probe_count = Arc::new(AtomicUsize::new(0));
            let count = Arc::clone(&probe_count);
            let check: AvailabilityCheck = Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    result.map_err(|()| WatchError::Connection("probe failed".to_string()))
                })
            });
            Self {
                probe_count,
                check: Some(check),
            }
        }

        fn without_check() -> Self {
            Self {
                probe_count: Arc::new(AtomicUsize::new(0)),
                check: None,
            }
        }

        fn probes(&self) -> usize {
            self.probe_count.load(Ordering::SeqCst)
        }
    }

    impl Watchable for ProbedWatchable {
        fn watch(&self) -> Result<Box<dyn Subscriber>, WatchError> {
            Ok(Box::new(FixedSubscriber::empty()))
        }

        fn type_name(&self) -> &str {
            "Probed"
        }

        fn availability_check(&self) -> Option<AvailabilityCheck> {
            self.check.clone()
        }
    }

    #[tokio::test]
    async fn test_no_check_is_always_available() {
        let cache = AvailabilityCache::new();
        let watchable = ProbedWatchable::without_check();

        assert!(cache.is_available(&watchable).await);
        assert_eq!(watchable.probes(), 0);
    }

    #[tokio::test]
    async fn test_probe_result_is_cached_within_interval() {
        let cache = AvailabilityCache::new();
        let watchable = ProbedWatchable::new(Ok(true));

        assert!(cache.is_available(&watchable).await);
        assert!(cache.is_available(&watchable).await);
        assert!(cache.is_available(&watchable).await);

        assert_eq!(watchable.probes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_reruns_after_interval() {
        let cache = AvailabilityCache::with_interval(Duration::from_secs(30));
        let watchable = ProbedWatchable::new(Ok(false));

        assert!(!cache.is_available(&watchable).await);
        assert_eq!(watchable.probes(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(!cache.is_available(&watchable).await);
        assert_eq!(watchable.probes(), 2);
    }

    #[tokio::test]
    async fn test_probe_failure_is_coerced_to_unavailable() {
        let cache = AvailabilityCache::new();
        let watchable = ProbedWatchable::new(Err(()));

        assert!(!cache.is_available(&watchable).await);
        assert_eq!(watchable.probes(), 1);
    }
}
