//! Error types for tree store operations.
//!
//! Every failure in the crate is a [`TreeError`]. The [`Result`] alias is the
//! shorthand used throughout.
//!
//! # Error Categories
//!
//! | Category | Variants | Retried by subscriptions |
//! |----------|----------|--------------------------|
//! | Transport | `Http`, `Connection`, `Timeout`, `StreamClosed`, `Aborted` | Yes |
//! | Decode | `Decode`, `Json`, `Path` | No (frame dropped) |
//! | Auth | `Auth`, `Cancelled` | Yes |
//! | Config | `Config` | No |
//!
//! One-shot operations never retry: the error goes straight back to the
//! caller. A subscription retries transport and auth failures with backoff
//! until it is cancelled, and reports a decode failure for a single frame
//! without tearing the feed down.
//!
//! # Examples
//!
//! ```
//! use firetree::{ErrorKind, TreeError};
//!
//! let err = TreeError::Timeout;
//! assert_eq!(err.kind(), ErrorKind::Transport);
//! assert!(err.is_retryable());
//!
//! let err = TreeError::Decode("expected object".into());
//! assert!(!err.is_retryable());
//! ```

use thiserror::Error;

/// Result type for tree store operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Coarse classification of a [`TreeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-success status, connection failure, timeout or stream loss.
    Transport,
    /// Payload does not match the expected shape, or a path does not resolve.
    Decode,
    /// The token provider failed or the server rejected the credentials.
    Auth,
    /// Invalid client setup.
    Config,
}

/// Errors that can occur while talking to the tree store.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TreeError {
    /// The server answered with a non-success status.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// The connection could not be established or broke mid-flight.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The caller-supplied deadline, or the subscription idle period, expired.
    #[error("Operation timed out")]
    Timeout,

    /// The server ended a live stream.
    #[error("Stream closed by server")]
    StreamClosed,

    /// Request was aborted before completion.
    #[error("Request aborted")]
    Aborted,

    /// Payload does not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path segment does not address anything in the local value.
    #[error("Cannot resolve path segment '{segment}': {reason}")]
    Path { segment: String, reason: String },

    /// The token provider failed or the token was revoked.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The server cancelled the listen, usually a rules rejection.
    #[error("Subscription cancelled by server: {0}")]
    Cancelled(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TreeError {
    pub(crate) fn http(status: u16, message: impl Into<String>) -> Self {
        TreeError::Http {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn unresolved(segment: &str, reason: impl Into<String>) -> Self {
        TreeError::Path {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }

    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::Http { .. }
            | TreeError::Connection(_)
            | TreeError::Timeout
            | TreeError::StreamClosed
            | TreeError::Aborted => ErrorKind::Transport,
            TreeError::Decode(_) | TreeError::Json(_) | TreeError::Path { .. } => {
                ErrorKind::Decode
            }
            TreeError::Auth(_) | TreeError::Cancelled(_) => ErrorKind::Auth,
            TreeError::Config(_) => ErrorKind::Config,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    #[inline]
    #[must_use]
    pub fn is_decode(&self) -> bool {
        self.kind() == ErrorKind::Decode
    }

    /// Whether a subscription should reconnect after this error.
    ///
    /// Auth failures count as transport failures here: the token may have
    /// rotated by the time the next attempt resolves it again.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Auth)
    }

    /// Returns `true` for HTTP 401 (Unauthorized) or 403 (Forbidden).
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, TreeError::Http { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transport() {
        assert_eq!(TreeError::Timeout.kind(), ErrorKind::Transport);
        assert!(TreeError::Timeout.is_retryable());
    }

    #[test]
    fn test_http_status_in_display() {
        let err = TreeError::http(503, "Service Unavailable");
        assert!(err.to_string().contains("503"));
        assert!(err.is_transport());
    }

    #[test]
    fn test_decode_not_retryable() {
        let err = TreeError::Decode("bad".into());
        assert!(err.is_decode());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_json_error_is_decode() {
        let err: TreeError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_path_error_names_segment() {
        let err = TreeError::unresolved("agee", "no such field on Profile");
        assert!(err.to_string().contains("agee"));
        assert!(err.is_decode());
    }

    #[test]
    fn test_auth_is_retryable() {
        assert!(TreeError::Auth("token provider failed".into()).is_retryable());
        assert!(TreeError::Cancelled("permission denied".into()).is_retryable());
    }

    #[test]
    fn test_config_not_retryable() {
        let err = TreeError::Config("relative URL without a base".into());
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_access_denied() {
        assert!(TreeError::http(401, "Unauthorized").is_access_denied());
        assert!(TreeError::http(403, "Forbidden").is_access_denied());
        assert!(!TreeError::http(500, "Internal Server Error").is_access_denied());
        assert!(!TreeError::Timeout.is_access_denied());
    }
}
