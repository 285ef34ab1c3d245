//! Tree store data types.

mod entity;
mod event;
mod frame;
mod path;
mod request;
mod response;

pub use entity::Entity;
pub use event::{ChangeEvent, ChangeKind};
pub use frame::{Frame, FrameKind, ServerEvent};
pub use path::Path;
pub use request::{Method, TreeRequest};
pub use response::TreeResponse;

pub use bytes::Bytes;
