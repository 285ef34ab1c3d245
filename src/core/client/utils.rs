//! Runtime helpers for the tree store client.

use std::future::Future;
use std::time::Duration;

/// Percent-encode one path segment for use in a resource URL.
///
/// ```
/// use firetree::client::encode_segment;
///
/// assert_eq!(encode_segment("a b"), "a%20b");
/// assert_eq!(encode_segment("-Nx_1"), "-Nx_1");
/// ```
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Run `future` with a deadline, mapping expiry to [`TreeError::Timeout`].
///
/// [`TreeError::Timeout`]: crate::TreeError::Timeout
pub async fn with_deadline<F, T>(deadline: Option<Duration>, future: F) -> crate::Result<T>
where
    F: Future<Output = crate::Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| crate::TreeError::Timeout)?,
        None => future.await,
    }
}

pub fn spawn_task<F>(future: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future)
}

pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
