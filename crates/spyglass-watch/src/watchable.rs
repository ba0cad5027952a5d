//! The capability contract each resource-kind adapter implements.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::WatchError;
use crate::subscriber::Subscriber;

/// Delay before re-checking a kind that is currently unavailable.
pub const DEFAULT_RETRY_SUBSCRIPTION_DELAY: Duration = Duration::from_secs(30);

/// Delay before resubscribing after a live subscription dies.
pub const DEFAULT_SELF_HEALING_DELAY: Duration = Duration::from_secs(5);

/// Async probe deciding whether a kind can currently be watched on this
/// cluster. May perform a network round trip; a probe error is treated as
/// "not available", never propagated.
pub type AvailabilityCheck =
    Arc<dyn Fn() -> BoxFuture<'static, Result<bool, WatchError>> + Send + Sync>;

/// An adapter exposing one resource kind's change stream plus its retry and
/// availability policy.
///
/// Identity and policy are fixed after construction; only the runtime
/// subscription state managed by the multiplexer changes.
pub trait Watchable: Send + Sync {
    /// Begin a fresh subscription attempt.
    ///
    /// Safe to call repeatedly; each call is an independent attempt. Must not
    /// block.
    ///
    /// # Errors
    ///
    /// Returns an error when the attempt fails before going live, e.g. an
    /// immediate connection refusal. The orchestrator treats this the same as
    /// a live subscription dying.
    fn watch(&self) -> Result<Box<dyn Subscriber>, WatchError>;

    /// Stable display name of the kind, e.g. `"Pod"`.
    fn type_name(&self) -> &str;

    /// Probe to run before any subscription attempt.
    ///
    /// `None` means the kind is always assumed available and `watch()` may be
    /// called without a probe.
    fn availability_check(&self) -> Option<AvailabilityCheck> {
        None
    }

    /// Whether a dead subscription should be retried.
    ///
    /// `false` is a deliberate opt-out for kinds known to be unsupported on
    /// some clusters; a close then stops the kind quietly for the lifetime of
    /// the connection.
    fn retry_subscription(&self) -> bool {
        true
    }

    /// Delay before re-checking an unavailable kind.
    fn retry_subscription_delay(&self) -> Duration {
        DEFAULT_RETRY_SUBSCRIPTION_DELAY
    }

    /// Delay before resubscribing after a live subscription dies.
    fn self_healing_delay(&self) -> Duration {
        DEFAULT_SELF_HEALING_DELAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::FixedSubscriber;

    struct BareWatchable;

    impl Watchable for BareWatchable {
        fn watch(&self) -> Result<Box<dyn Subscriber>, WatchError> {
            Ok(Box::new(FixedSubscriber::empty()))
        }

        fn type_name(&self) -> &str {
            "Bare"
        }
    }

    #[test]
    fn test_default_policy() {
        let watchable = BareWatchable;

        assert!(watchable.retry_subscription());
        assert_eq!(
            watchable.retry_subscription_delay(),
            Duration::from_secs(30)
        );
        assert_eq!(watchable.self_healing_delay(), Duration::from_secs(5));
        assert!(watchable.availability_check().is_none());
    }
}
