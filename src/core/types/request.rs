//! Outbound request parameters.

use crate::core::error::Result;
use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP verb of a tree store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against a resolved URL.
#[derive(Debug, Clone, Default)]
pub struct TreeRequest {
    pub method: Method,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub extra_headers: BTreeMap<String, String>,
    /// Deadline for the whole exchange; `None` uses the client default.
    pub timeout: Option<Duration>,
}

impl TreeRequest {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get() -> Self {
        Self::new().with_method(Method::Get)
    }

    pub fn delete() -> Self {
        Self::new().with_method(Method::Delete)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_body(body)
            .with_content_type("application/json"))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_get() {
        let request = TreeRequest::new();
        assert_eq!(request.method, Method::Get);
        assert!(!request.has_body());
        assert!(request.timeout.is_none());
    }

    #[test]
    fn test_with_json_sets_content_type() {
        let request = TreeRequest::new()
            .with_method(Method::Put)
            .with_json(&json!({"name": "a"}))
            .unwrap();
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
        assert_eq!(&request.body[..], br#"{"name":"a"}"#);
    }

    #[test]
    fn test_builder_chain() {
        let request = TreeRequest::delete()
            .with_header("x-trace", "1")
            .with_timeout(Duration::from_secs(2));
        assert_eq!(request.method.as_str(), "DELETE");
        assert_eq!(request.extra_headers.get("x-trace").map(String::as_str), Some("1"));
        assert_eq!(request.timeout, Some(Duration::from_secs(2)));
    }
}
