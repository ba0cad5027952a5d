//! Subscription primitive: the bridge between one underlying watch
//! connection and the shared event sink.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::StreamExt;
use rand::Rng;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::WatchError;
use crate::event::{WatchAction, WatchEvent};

/// Base client-side timeout for one underlying watch connection.
///
/// Cluster watches are not reliable; the API server might stop producing
/// events while keeping the connection open. Bounding the connection forces a
/// periodic reconnect, absorbed transparently by healing.
pub const WATCH_TIMEOUT: Duration = Duration::from_secs(900);

const MAX_JITTER_SECS: u64 = 10;

/// One-shot callback fired when the underlying connection ends on its own:
/// `Ok(())` for a clean completion, `Err(cause)` for a failure.
///
/// Never fired for an explicit [`WatchHandle::close`].
pub type CloseHandler = Box<dyn FnOnce(Result<(), WatchError>) + Send + 'static>;

/// The single ordered output channel a multiplexer writes every event into.
///
/// Cheap to clone; all clones feed the same downstream connection. The sink
/// reports cancellation once the downstream receiver has been dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<WatchEvent>,
}

impl EventSink {
    /// Wrap the sending half of a downstream connection's channel.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<WatchEvent>) -> Self {
        Self { tx }
    }

    /// Push one event downstream.
    ///
    /// Returns `false` once the downstream has cancelled; the event is then
    /// dropped.
    pub fn emit(&self, event: WatchEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the downstream receiver has been dropped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolve once the downstream receiver has been dropped.
    pub async fn cancelled(&self) {
        self.tx.closed().await;
    }
}

/// The live binding between a Watchable and its underlying connection.
///
/// Closing releases the underlying connection without firing the close
/// handler. `close()` is idempotent and is a no-op after the connection
/// already closed itself.
#[derive(Debug)]
pub struct WatchHandle {
    token: CancellationToken,
}

impl WatchHandle {
    /// Build a handle around the cancellation token a subscriber observes.
    #[must_use]
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Handle for subscriptions with no underlying connection to release.
    #[must_use]
    pub fn inert() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Release the underlying connection. Idempotent.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Whether this handle has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// One subscription attempt, started by the orchestrator via
/// [`Watchable::watch`](crate::Watchable::watch).
///
/// The primitive never retries on its own; retry policy lives exclusively in
/// the multiplexer.
pub trait Subscriber: Send {
    /// Start forwarding events from the underlying connection into `sink`.
    ///
    /// Must not block: connection-establishment latency is absorbed by the
    /// underlying transport. Events are forwarded verbatim, in connection
    /// order. `on_close` fires at most once, when the connection ends on its
    /// own; it does not fire for an explicit close of the returned handle.
    fn subscribe(self: Box<Self>, on_close: CloseHandler, sink: EventSink) -> WatchHandle;
}

/// Async open of one underlying watch connection.
///
/// Receives the effective timeout (base plus jitter) so the adapter can
/// forward it to the server-side watch request.
pub type ConnectFn = Box<
    dyn FnOnce(Duration) -> BoxFuture<'static, Result<BoxStream<'static, Result<WatchEvent, WatchError>>, WatchError>>
        + Send,
>;

/// Adapts one underlying cluster watch connection into the shared sink.
///
/// The connection is bounded by [`WATCH_TIMEOUT`] plus a small random jitter
/// so that many subscriptions started at the same time do not all expire and
/// reconnect simultaneously.
pub struct StreamSubscriber {
    connect: ConnectFn,
    base_timeout: Duration,
}

impl StreamSubscriber {
    /// Create a subscriber that opens its connection through `connect`.
    #[must_use]
    pub fn new(connect: ConnectFn) -> Self {
        Self {
            connect,
            base_timeout: WATCH_TIMEOUT,
        }
    }

    /// Override the base connection timeout.
    #[must_use]
    pub fn with_timeout(mut self, base_timeout: Duration) -> Self {
        self.base_timeout = base_timeout;
        self
    }
}

impl Subscriber for StreamSubscriber {
    fn subscribe(self: Box<Self>, on_close: CloseHandler, sink: EventSink) -> WatchHandle {
        let Self {
            connect,
            base_timeout,
        } = *self;
        let jitter = rand::thread_rng().gen_range(1..=MAX_JITTER_SECS);
        let deadline = base_timeout + Duration::from_secs(jitter);

        let token = CancellationToken::new();
        let task_token = token.clone();
        tokio::spawn(async move {
            let mut stream = tokio::select! {
                () = task_token.cancelled() => return,
                connected = connect(deadline) => match connected {
                    Ok(stream) => stream,
                    Err(cause) => {
                        on_close(Err(cause));
                        return;
                    }
                },
            };

            let timeout = tokio::time::sleep(deadline);
            tokio::pin!(timeout);
            loop {
                tokio::select! {
                    () = task_token.cancelled() => return,
                    () = sink.cancelled() => return,
                    () = &mut timeout => {
                        // Forced-reconnect heartbeat, a clean close.
                        on_close(Ok(()));
                        return;
                    }
                    item = stream.next() => match item {
                        Some(Ok(event)) => {
                            if !sink.emit(event) {
                                return;
                            }
                        }
                        Some(Err(cause)) => {
                            on_close(Err(cause));
                            return;
                        }
                        None => {
                            on_close(Ok(()));
                            return;
                        }
                    }
                }
            }
        });

        WatchHandle::new(token)
    }
}

/// Degenerate subscription over a fixed set of known values: a stream of
/// `0..N` items with no further updates.
///
/// Emits its items once as `ADDED` events at subscribe time and never closes
/// on its own; it only goes away when cancelled.
pub struct FixedSubscriber {
    items: Vec<Value>,
}

impl FixedSubscriber {
    /// A subscription that emits nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// A subscription that emits the given payloads once.
    #[must_use]
    pub fn items(items: Vec<Value>) -> Self {
        Self { items }
    }
}

impl Subscriber for FixedSubscriber {
    fn subscribe(self: Box<Self>, _on_close: CloseHandler, sink: EventSink) -> WatchHandle {
        for item in self.items {
            if !sink.emit(WatchEvent::new(WatchAction::Added, item)) {
                break;
            }
        }
        WatchHandle::inert()
    }
}
