//! Tree store client implementation.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch          - TreeClient and ClientBuilder
//! ├── config         - Client configuration
//! ├── stream         - Live subscriptions (ChangeStream)
//! ├── retry          - Reconnect backoff
//! ├── native_network - reqwest transport (feature `client`)
//! ├── parser         - text/event-stream splitter for the native transport
//! └── utils          - Escaping, deadlines, task helpers
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TreeClient`] | Handle to one store; hands out queries |
//! | [`ClientBuilder`] | Assembles a client from address, auth and transport |
//! | [`Subscription`] | Typed live feed backed by a local cache |
//! | [`ClientConfig`] | Timeouts, backoff and URL conventions |
//!
//! # Examples
//!
//! ```no_run
//! use firetree::{ChangeKind, TreeClient};
//! use futures::StreamExt;
//! use std::collections::BTreeMap;
//!
//! # async fn run() -> firetree::Result<()> {
//! let client = TreeClient::builder("https://example-db.firebaseio.com")
//!     .auth_token("secret")
//!     .build()?;
//!
//! let items = client.child("items");
//! items.create_with_generated_key(BTreeMap::from([("name", "a")])).await?;
//!
//! let mut live = items.subscribe::<BTreeMap<String, String>>();
//! while let Some(change) = live.next().await {
//!     let change = change?;
//!     if change.kind == ChangeKind::Deleted {
//!         println!("{} is gone", change.key());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod fetch;
#[cfg(feature = "client")]
mod native_network;
mod parser;
pub mod retry;
mod stream;
mod utils;

pub use config::ClientConfig;
pub use fetch::{ClientBuilder, TreeClient};
#[cfg(feature = "client")]
pub use native_network::NativeNetwork;
pub use parser::EventParser;
pub use retry::{RetryConfig, RetryDecision, RetryState};
pub use stream::{StreamState, Subscription};
pub use utils::*;
