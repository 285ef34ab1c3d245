//! firetree: client for realtime hierarchical JSON tree stores.
//!
//! - **Queries** compose a location from a chain of children and run
//!   one-shot reads and writes against it, authenticated with a token that
//!   is resolved fresh for every request.
//! - **Keys** for new children are minted locally and sort by creation time.
//! - **Subscriptions** keep a streaming connection open and merge every
//!   incremental `(path, payload)` notification into a typed local cache,
//!   reporting which top-level entities were added, changed or deleted.
//!
//! ```no_run
//! use firetree::{tree_record, ChangeKind, TreeClient};
//! use futures::StreamExt;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Item {
//!     #[serde(default)]
//!     name: String,
//!     #[serde(default)]
//!     count: u32,
//! }
//!
//! tree_record!(Item { name, count });
//!
//! # async fn run() -> firetree::Result<()> {
//! let client = TreeClient::new("https://example-db.firebaseio.com")?;
//! let items = client.child("items");
//!
//! let created = items.create_with_generated_key(Item { name: "a".into(), count: 1 }).await?;
//! items.child(created.key()).patch_merge(&serde_json::json!({"count": 2})).await?;
//!
//! let mut live = items.subscribe::<Item>();
//! while let Some(change) = live.next().await {
//!     let change = change?;
//!     match change.kind {
//!         ChangeKind::Added | ChangeKind::Changed => println!("{} = {:?}", change.key(), change.value()),
//!         ChangeKind::Deleted => println!("{} removed", change.key()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;

// Top-level re-exports for common usage
pub use crate::core::error::{ErrorKind, Result, TreeError};
pub use crate::core::types;
pub use crate::core::types::{ChangeEvent, ChangeKind, Entity, Frame, FrameKind, Path, ServerEvent};

pub use crate::core::auth;
pub use crate::core::cache;
pub use crate::core::cache::{CacheMode, LocalCache, SharedCache, TreeNode};
pub use crate::core::key::KeyGenerator;
pub use crate::core::query;
pub use crate::core::query::{PathBuilder, Query};
pub use crate::core::traits::{Clock, EventFeed, SystemClock, TokenProvider, TreeNetwork};

pub use crate::core::client;
pub use crate::core::client::{ClientBuilder, ClientConfig, StreamState, Subscription, TreeClient};
