//! Query locations.
//!
//! A [`Query`] is a position in the store reached by chaining children from
//! the client's root. [`QueryNode`] is the immutable chain underneath and
//! [`PathBuilder`] turns a chain into a URL.

mod node;
mod tree_query;

pub use node::{PathBuilder, QueryNode, SegmentFn};
pub use tree_query::Query;
