//! Live subscriptions.
//!
//! Each [`Subscription`] owns one background task that keeps a streaming
//! connection open, applies every incoming frame to the subscription's
//! [`LocalCache`](crate::LocalCache) and forwards the resulting [`ChangeEvent`]s.
//!
//! # States
//!
//! ```text
//! Idle -> Connecting -> Listening -> Reconnecting -> Connecting -> ...
//!                                \-> Closed (cancelled or unrecoverable)
//! ```
//!
//! Frames are applied one at a time in arrival order. The event channel is
//! bounded: when the consumer falls behind, the task stops reading frames
//! until there is room again.
//!
//! Failures are reported on the stream as `Err` items. A frame that fails to
//! decode is skipped and the feed carries on; transport and auth failures
//! trigger a reconnect with backoff, which resolves the token again.

use crate::core::cache::{SharedCache, TreeNode};
use crate::core::client::{sleep, spawn_task, with_deadline, RetryConfig, RetryDecision, RetryState};
use crate::core::error::{Result, TreeError};
use crate::core::query::Query;
use crate::core::traits::EventFeed;
use crate::core::types::{ChangeEvent, Entity, Frame, FrameKind};
use futures::Stream;
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    Listening,
    Reconnecting,
    Closed,
}

/// Typed live feed over one location.
///
/// Dropping the subscription cancels it.
pub struct Subscription<T> {
    events: Pin<Box<async_channel::Receiver<Result<ChangeEvent<T>>>>>,
    state: watch::Receiver<StreamState>,
    cache: SharedCache<T>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T>
where
    T: TreeNode + Clone + Default + DeserializeOwned + Send + Sync + 'static,
{
    pub(crate) fn spawn(query: Query, cache: SharedCache<T>) -> Self {
        let buffer = query.client().config().event_buffer.max(1);
        let (events_tx, events_rx) = async_channel::bounded(buffer);
        let (state_tx, state_rx) = watch::channel(StreamState::Idle);
        let cancel = CancellationToken::new();

        let worker = Worker {
            retry: RetryState::new(RetryConfig::from_client(query.client().config())),
            query,
            cache: cache.clone(),
            events: events_tx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = spawn_task(worker.run());

        Subscription {
            events: Box::pin(events_rx),
            state: state_rx,
            cache,
            cancel,
            task: Some(task),
        }
    }

    /// Next change, `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<Result<ChangeEvent<T>>> {
        self.events.recv().await.ok()
    }

    /// Copy of the cached entities, ordered by key.
    pub fn snapshot(&self) -> Vec<Entity<T>> {
        self.cache.read().entities()
    }

    /// The cache this subscription writes into.
    pub fn cache(&self) -> &SharedCache<T> {
        &self.cache
    }
}

impl<T> Subscription<T> {
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Receiver for state transitions.
    pub fn state_changes(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Request closure without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Close the subscription and wait until the task has stopped.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Result<ChangeEvent<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("state", &self.state())
            .finish()
    }
}

/// Why a connection ended.
enum Outcome {
    Cancelled,
    Failed(TreeError),
}

struct Worker<T> {
    query: Query,
    cache: SharedCache<T>,
    events: async_channel::Sender<Result<ChangeEvent<T>>>,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
    retry: RetryState,
}

impl<T> Worker<T>
where
    T: TreeNode + Clone + Default + DeserializeOwned + Send + Sync + 'static,
{
    async fn run(mut self) {
        let path = self.query.path();
        loop {
            self.transition(StreamState::Connecting, &path);

            let error = match self.connect().await {
                Ok(frames) => {
                    self.transition(StreamState::Listening, &path);
                    self.retry.reset();
                    match self.listen(frames).await {
                        Outcome::Cancelled => break,
                        Outcome::Failed(e) => e,
                    }
                }
                Err(_) if self.cancel.is_cancelled() => break,
                Err(e) => e,
            };

            let decision = self.retry.should_retry(&error);
            match &decision {
                RetryDecision::Retry(delay) => tracing::warn!(
                    %path,
                    attempt = self.retry.attempts,
                    ?delay,
                    error = %error,
                    "subscription interrupted, reconnecting"
                ),
                RetryDecision::DontRetry => {
                    tracing::warn!(%path, error = %error, "subscription failed permanently")
                }
            }

            if !self.emit(Err(error)).await {
                break;
            }

            match decision {
                RetryDecision::Retry(delay) => {
                    self.transition(StreamState::Reconnecting, &path);
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = sleep(delay) => {}
                    }
                }
                RetryDecision::DontRetry => break,
            }
        }
        self.transition(StreamState::Closed, &path);
    }

    async fn connect(&self) -> Result<EventFeed> {
        let deadline = self.query.client().config().connection_timeout();
        let open = with_deadline(Some(deadline), async {
            let url = self.query.authenticated_url().await?;
            self.query.client().network().subscribe(&url).await
        });
        tokio::select! {
            _ = self.cancel.cancelled() => Err(TreeError::Aborted),
            result = open => result,
        }
    }

    async fn listen(&self, frames: EventFeed) -> Outcome {
        let idle = self.query.client().config().idle_timeout();
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return Outcome::Cancelled,
                next = tokio::time::timeout(idle, frames.recv()) => next,
            };

            let decoded = match next {
                Err(_) => return Outcome::Failed(TreeError::Timeout),
                Ok(None) => return Outcome::Failed(TreeError::StreamClosed),
                Ok(Some(Err(e))) if !e.is_decode() => return Outcome::Failed(e),
                Ok(Some(Err(e))) => Err(e),
                Ok(Some(Ok(event))) => Frame::from_event(&event),
            };

            let frame = match decoded {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping undecodable event");
                    if !self.emit(Err(e)).await {
                        return Outcome::Cancelled;
                    }
                    continue;
                }
            };

            match frame.kind {
                FrameKind::KeepAlive => continue,
                FrameKind::Cancel => return Outcome::Failed(TreeError::Cancelled(frame.data)),
                FrameKind::AuthRevoked => {
                    return Outcome::Failed(TreeError::Auth(format!(
                        "credentials revoked: {}",
                        frame.data
                    )))
                }
                FrameKind::Put | FrameKind::Patch => {
                    if !self.apply(&frame).await {
                        return Outcome::Cancelled;
                    }
                }
            }
        }
    }

    /// Apply one frame and forward its events. `false` once nobody listens.
    async fn apply(&self, frame: &Frame) -> bool {
        let applied = self.cache.write().apply_frame(frame);
        match applied {
            Ok(changes) => {
                for change in changes {
                    if !self.emit(Ok(change)).await {
                        return false;
                    }
                }
                true
            }
            Err(e) => {
                tracing::warn!(path = %frame.path, error = %e, "frame rejected, cache unchanged");
                self.emit(Err(e)).await
            }
        }
    }

    async fn emit(&self, item: Result<ChangeEvent<T>>) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            sent = self.events.send(item) => sent.is_ok(),
        }
    }

    fn transition(&self, next: StreamState, path: &str) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(%path, from = ?previous, to = ?next, "subscription state");
        }
    }
}
