//! Declarative registry of watchable kinds.
//!
//! One [`KindSpec`] per resource kind replaces a class per kind: a kind is a
//! name, a subscriber factory, and its retry/availability policy, assembled
//! statically and handed to the hub constructor.

use std::sync::Arc;
use std::time::Duration;

use crate::error::WatchError;
use crate::subscriber::Subscriber;
use crate::watchable::{
    AvailabilityCheck, Watchable, DEFAULT_RETRY_SUBSCRIPTION_DELAY, DEFAULT_SELF_HEALING_DELAY,
};

/// Produces one fresh subscription attempt per call.
pub type SubscriberFactory =
    Arc<dyn Fn() -> Result<Box<dyn Subscriber>, WatchError> + Send + Sync>;

/// One resource kind, described declaratively.
pub struct KindSpec {
    name: String,
    factory: SubscriberFactory,
    availability_check: Option<AvailabilityCheck>,
    retry_subscription: bool,
    retry_subscription_delay: Duration,
    self_healing_delay: Duration,
}

impl KindSpec {
    /// Describe a kind with default policy: retries on, 30s unavailable
    /// backoff, 5s healing backoff, no availability probe.
    #[must_use]
    pub fn new(name: impl Into<String>, factory: SubscriberFactory) -> Self {
        Self {
            name: name.into(),
            factory,
            availability_check: None,
            retry_subscription: true,
            retry_subscription_delay: DEFAULT_RETRY_SUBSCRIPTION_DELAY,
            self_healing_delay: DEFAULT_SELF_HEALING_DELAY,
        }
    }

    /// Gate subscription attempts behind an availability probe.
    #[must_use]
    pub fn with_availability_check(mut self, check: AvailabilityCheck) -> Self {
        self.availability_check = Some(check);
        self
    }

    /// Set whether a dead subscription is retried.
    #[must_use]
    pub const fn with_retry_subscription(mut self, retry: bool) -> Self {
        self.retry_subscription = retry;
        self
    }

    /// Set the delay before re-checking an unavailable kind.
    #[must_use]
    pub const fn with_retry_subscription_delay(mut self, delay: Duration) -> Self {
        self.retry_subscription_delay = delay;
        self
    }

    /// Set the delay before resubscribing after a live subscription dies.
    #[must_use]
    pub const fn with_self_healing_delay(mut self, delay: Duration) -> Self {
        self.self_healing_delay = delay;
        self
    }
}

impl Watchable for KindSpec {
    fn watch(&self) -> Result<Box<dyn Subscriber>, WatchError> {
        (self.factory)()
    }

    fn type_name(&self) -> &str {
        &self.name
    }

    fn availability_check(&self) -> Option<AvailabilityCheck> {
        self.availability_check.clone()
    }

    fn retry_subscription(&self) -> bool {
        self.retry_subscription
    }

    fn retry_subscription_delay(&self) -> Duration {
        self.retry_subscription_delay
    }

    fn self_healing_delay(&self) -> Duration {
        self.self_healing_delay
    }
}

/// Collects the kinds the hub will watch.
#[derive(Default)]
pub struct KindRegistry {
    kinds: Vec<Arc<dyn Watchable>>,
}

impl KindRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaratively described kind.
    #[must_use]
    pub fn register(mut self, spec: KindSpec) -> Self {
        self.kinds.push(Arc::new(spec));
        self
    }

    /// Register a hand-rolled [`Watchable`] implementation.
    #[must_use]
    pub fn register_watchable(mut self, watchable: Arc<dyn Watchable>) -> Self {
        self.kinds.push(watchable);
        self
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Hand the assembled adapter list to the hub constructor.
    #[must_use]
    pub fn into_watchables(self) -> Vec<Arc<dyn Watchable>> {
        self.kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::FixedSubscriber;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn empty_factory() -> SubscriberFactory {
        Arc::new(|| Ok(Box::new(FixedSubscriber::empty()) as Box<dyn Subscriber>))
    }

    #[test]
    fn test_spec_defaults() {
        let spec = KindSpec::new("Pod", empty_factory());

        assert_eq!(spec.type_name(), "Pod");
        assert!(spec.retry_subscription());
        assert_eq!(spec.retry_subscription_delay(), Duration::from_secs(30));
        assert_eq!(spec.self_healing_delay(), Duration::from_secs(5));
        assert!(spec.availability_check().is_none());
    }

    #[test]
    fn test_spec_overrides() {
        let spec = KindSpec::new("Route", empty_factory())
            .with_retry_subscription(false)
            .with_retry_subscription_delay(Duration::from_secs(60))
            .with_self_healing_delay(Duration::from_secs(1))
            .with_availability_check(Arc::new(|| Box::pin(async { Ok(false) })));

        assert!(!spec.retry_subscription());
        assert_eq!(spec.retry_subscription_delay(), Duration::from_secs(60));
        assert_eq!(spec.self_healing_delay(), Duration::from_secs(1));
        assert!(spec.availability_check().is_some());
    }

    #[test]
    fn test_spec_watch_delegates_to_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let spec = KindSpec::new(
            "ConfigMap",
            Arc::new(move || {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(FixedSubscriber::empty()) as Box<dyn Subscriber>)
            }),
        );

        assert!(spec.watch().is_ok());
        assert!(spec.watch().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registry_collects_kinds() {
        let registry = KindRegistry::new()
            .register(KindSpec::new("Pod", empty_factory()))
            .register(KindSpec::new("Namespace", empty_factory()));

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());

        let watchables = registry.into_watchables();
        assert_eq!(watchables[0].type_name(), "Pod");
        assert_eq!(watchables[1].type_name(), "Namespace");
    }
}
