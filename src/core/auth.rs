//! Ready-made [`TokenProvider`] implementations.
//!
//! The client never issues tokens itself. It asks a provider for the current
//! one right before each request, so rotating credentials only requires the
//! provider to hand out the new value.

use crate::core::error::{Result, TreeError};
use crate::core::traits::TokenProvider;
use async_trait::async_trait;
use std::future::Future;

/// A fixed token, e.g. a database secret or a long-lived ID token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(TreeError::Auth("empty token".into()));
        }
        Ok(self.0.clone())
    }
}

/// Provider backed by an async closure.
pub struct TokenFn<F>(F);

/// Wrap an async closure as a [`TokenProvider`].
///
/// ```
/// use firetree::auth::token_fn;
///
/// let provider = token_fn(|| async { Ok("fresh-token".to_string()) });
/// # let _ = provider;
/// ```
pub fn token_fn<F, Fut>(f: F) -> TokenFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    TokenFn(f)
}

#[async_trait]
impl<F, Fut> TokenProvider for TokenFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    async fn token(&self) -> Result<String> {
        (self.0)().await.map_err(|e| match e {
            TreeError::Auth(msg) => TreeError::Auth(msg),
            other => TreeError::Auth(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("secret");
        assert_eq!(provider.token().await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn test_static_token_empty_is_auth_error() {
        let err = StaticToken::new("").token().await.unwrap_err();
        assert!(matches!(err, TreeError::Auth(_)));
    }

    #[test]
    fn test_static_token_debug_redacted() {
        let debug = format!("{:?}", StaticToken::new("secret"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_token_fn_called_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let provider = token_fn(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(format!("token-{}", n)) }
        });

        assert_eq!(provider.token().await.unwrap(), "token-0");
        assert_eq!(provider.token().await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_token_fn_failure_maps_to_auth() {
        let provider = token_fn(|| async { Err(TreeError::Connection("idp down".into())) });
        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, TreeError::Auth(ref msg) if msg.contains("idp down")));
    }
}
