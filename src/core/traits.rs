use crate::core::error::Result;
use crate::core::types::{ServerEvent, TreeRequest, TreeResponse};
use async_trait::async_trait;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Abstraction for network operations against the tree store.
#[async_trait]
pub trait TreeNetwork: Send + Sync + 'static {
    /// Perform a single request and return the full response.
    async fn fetch(&self, url: &str, req: TreeRequest) -> Result<TreeResponse>;

    /// Open a live event stream at `url`.
    ///
    /// Resolves once the server accepted the stream. Events arrive on the
    /// returned feed in order; the feed ends when the server ends the
    /// stream, and a transport failure is delivered as an `Err` item.
    /// Dropping the feed must release the underlying connection.
    async fn subscribe(&self, url: &str) -> Result<EventFeed>;
}

/// Receiving end of a live event stream opened by [`TreeNetwork::subscribe`].
///
/// Holds the transport's release token: dropping the feed cancels it, so the
/// reader behind the feed stops even if the server never sends another byte.
#[derive(Debug)]
pub struct EventFeed {
    events: async_channel::Receiver<Result<ServerEvent>>,
    _release: Option<DropGuard>,
}

impl EventFeed {
    /// Feed over a channel whose sender needs no extra teardown.
    pub fn new(events: async_channel::Receiver<Result<ServerEvent>>) -> Self {
        EventFeed {
            events,
            _release: None,
        }
    }

    /// Feed that cancels `release` when dropped.
    pub fn with_release(
        events: async_channel::Receiver<Result<ServerEvent>>,
        release: CancellationToken,
    ) -> Self {
        EventFeed {
            events,
            _release: Some(release.drop_guard()),
        }
    }

    /// Next item, `None` once the stream has ended.
    pub async fn recv(&self) -> Option<Result<ServerEvent>> {
        self.events.recv().await.ok()
    }
}

/// Supplies the bearer token attached to every request.
///
/// Invoked fresh for each request and each subscription (re)connect.
#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn token(&self) -> Result<String>;
}

/// Wall-clock source for key generation.
pub trait Clock: Send + Sync + 'static {
    /// Current Unix timestamp in milliseconds.
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
