//! Realtime tree store client core.
//!
//! # Modules
//!
//! - [`client`] - client handle, configuration, subscriptions and transport
//! - [`query`] - query node chains, URL composition, reads and writes
//! - [`cache`] - typed local mirror and the merge engine
//! - [`key`] - time-ordered key generation
//! - [`auth`] - token providers
//! - [`types`] - paths, entities, change events, frames, requests, responses
//! - [`traits`] - transport, token and clock seams

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod key;
pub mod query;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, Result, TreeError};
pub use types::{ChangeEvent, ChangeKind, Entity, Path};
