//! Configuration for the tree store client.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `request_timeout_ms` | 30000 | Deadline for one-shot operations |
//! | `connection_timeout_secs` | 30 | TCP/TLS connect timeout |
//! | `idle_timeout_secs` | 60 | Subscription silence before reconnecting |
//! | `reconnect_initial_backoff_ms` | 1000 | First reconnect delay |
//! | `reconnect_max_backoff_ms` | 30000 | Reconnect delay cap |
//! | `reconnect_max_attempts` | none | Consecutive failures before a subscription gives up |
//! | `event_buffer` | 100 | Undelivered change events per subscription |
//! | `resource_suffix` | `.json` | Appended to every resource URL |
//! | `auth_param` | `auth` | Query parameter carrying the token |
//! | `proxy_url` | empty | Proxy for the native transport |
//!
//! # Examples
//!
//! ```
//! use firetree::ClientConfig;
//!
//! let config = ClientConfig {
//!     idle_timeout_secs: 90,
//!     ..Default::default()
//! };
//! assert_eq!(config.request_timeout_ms, 30_000);
//! assert_eq!(config.idle_timeout(), std::time::Duration::from_secs(90));
//! ```

use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Default deadline for reads and writes, in milliseconds.
    ///
    /// A [`Query`](crate::Query) can override it with `with_timeout`.
    pub request_timeout_ms: u64,

    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,

    /// Seconds without any event (keep-alives included) after which a live
    /// subscription is considered broken and reconnects.
    pub idle_timeout_secs: u64,

    /// Delay before the first reconnect attempt, in milliseconds.
    ///
    /// Doubles on each consecutive failure up to `reconnect_max_backoff_ms`.
    pub reconnect_initial_backoff_ms: u64,

    /// Upper bound on the reconnect delay, in milliseconds.
    pub reconnect_max_backoff_ms: u64,

    /// Consecutive failed connections after which a subscription closes.
    ///
    /// `None` keeps reconnecting until the subscription is cancelled. The
    /// count starts over after every successful connect.
    pub reconnect_max_attempts: Option<u32>,

    /// Capacity of the per-subscription event channel.
    ///
    /// When the consumer falls behind by this many events the subscription
    /// stops reading frames until it catches up.
    pub event_buffer: usize,

    /// Suffix appended to the resolved path, `.json` for the REST surface.
    pub resource_suffix: String,

    /// Name of the query parameter carrying the bearer token.
    pub auth_param: String,

    /// Proxy URL (optional).
    pub proxy_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            connection_timeout_secs: 30,
            idle_timeout_secs: 60,
            reconnect_initial_backoff_ms: 1_000,
            reconnect_max_backoff_ms: 30_000,
            reconnect_max_attempts: None,
            event_buffer: 100,
            resource_suffix: ".json".to_string(),
            auth_param: "auth".to_string(),
            proxy_url: String::new(),
        }
    }
}

impl ClientConfig {
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[inline]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    #[inline]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.reconnect_initial_backoff_ms, 1_000);
        assert_eq!(config.reconnect_max_backoff_ms, 30_000);
        assert_eq!(config.reconnect_max_attempts, None);
        assert_eq!(config.event_buffer, 100);
        assert_eq!(config.resource_suffix, ".json");
        assert_eq!(config.auth_param, "auth");
        assert!(config.proxy_url.is_empty());
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig {
            resource_suffix: String::new(),
            ..Default::default()
        };
        assert!(config.resource_suffix.is_empty());
        assert_eq!(config.event_buffer, 100);
    }
}
