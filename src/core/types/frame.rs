//! Inbound notifications on a live subscription.
//!
//! The transport hands over [`ServerEvent`]s (an event name plus its raw
//! data). Turning those into [`Frame`]s is the subscription's job, so a
//! malformed event fails that one frame instead of the transport.
//!
//! | Event | Data | Effect |
//! |-------|------|--------|
//! | `put` | `{"path": "...", "data": ...}` | write at path |
//! | `patch` | `{"path": "...", "data": {...}}` | merge at path |
//! | `keep-alive` | `null` | none, resets the idle timer |
//! | `cancel` | reason | listen rejected by the server |
//! | `auth_revoked` | reason | credentials expired |

use crate::core::error::{Result, TreeError};
use serde::Deserialize;
use serde_json::Value;

/// Raw event as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

impl ServerEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        ServerEvent {
            event: event.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Replace the value at `path`.
    Put,
    /// Merge the children in `data` into the value at `path`.
    Patch,
    KeepAlive,
    Cancel,
    AuthRevoked,
}

/// One decoded notification.
///
/// `data` holds the JSON text of the payload, or an empty string when the
/// server reported `null` (the subtree at `path` is gone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub path: String,
    pub data: String,
}

#[derive(Deserialize)]
struct FrameBody {
    path: String,
    #[serde(default)]
    data: Value,
}

impl Frame {
    pub fn put(path: impl Into<String>, data: impl Into<String>) -> Self {
        Frame {
            kind: FrameKind::Put,
            path: path.into(),
            data: data.into(),
        }
    }

    pub fn patch(path: impl Into<String>, data: impl Into<String>) -> Self {
        Frame {
            kind: FrameKind::Patch,
            path: path.into(),
            data: data.into(),
        }
    }

    fn control(kind: FrameKind, data: &str) -> Self {
        Frame {
            kind,
            path: String::new(),
            data: data.trim().trim_matches('"').to_string(),
        }
    }

    /// Decode a server event into a frame.
    ///
    /// # Errors
    ///
    /// [`TreeError::Decode`] for unknown event names or a `put`/`patch` body
    /// that is not `{path, data}`.
    pub fn from_event(event: &ServerEvent) -> Result<Self> {
        let kind = match event.event.trim() {
            "put" => FrameKind::Put,
            "patch" => FrameKind::Patch,
            "keep-alive" => return Ok(Self::control(FrameKind::KeepAlive, &event.data)),
            "cancel" => return Ok(Self::control(FrameKind::Cancel, &event.data)),
            "auth_revoked" => return Ok(Self::control(FrameKind::AuthRevoked, &event.data)),
            other => {
                return Err(TreeError::Decode(format!("unknown event type '{}'", other)));
            }
        };

        let body: FrameBody = serde_json::from_str(&event.data)
            .map_err(|e| TreeError::Decode(format!("malformed {} frame: {}", event.event, e)))?;

        let data = match body.data {
            Value::Null => String::new(),
            other => other.to_string(),
        };

        Ok(Frame {
            kind,
            path: body.path,
            data,
        })
    }

    /// Whether this frame removes the subtree at its path.
    #[inline]
    pub fn is_deletion(&self) -> bool {
        matches!(self.kind, FrameKind::Put | FrameKind::Patch) && self.data.trim().is_empty()
    }
}
