//! Local mirror of a watched subtree.
//!
//! [`LocalCache`] applies incremental `(path, payload)` notifications to a
//! typed value and reports which top-level entities changed.
//!
//! # Modes
//!
//! | Mode | Root | First path segment |
//! |------|------|--------------------|
//! | Collection | `key -> T` map | entity key |
//! | Object | a single `T` | field of `T` |
//!
//! Below the root, each segment is resolved by whatever value the walk has
//! reached (see [`TreeNode`]): maps treat it as a key, records as a field.
//!
//! # Atomicity
//!
//! A notification is applied to a working copy of the affected entity and
//! committed only when the whole write succeeded. A payload that fails to
//! decode, or a path that does not resolve, leaves the cache untouched.
//!
//! # Example
//!
//! ```
//! use firetree::{ChangeKind, LocalCache};
//! use std::collections::BTreeMap;
//!
//! let mut cache: LocalCache<BTreeMap<String, String>> = LocalCache::new();
//!
//! let events = cache.apply("/", r#"{"k1":{"name":"a"}}"#).unwrap();
//! assert_eq!(events[0].kind, ChangeKind::Added);
//!
//! let events = cache.apply("/k1", r#"{"name":"b"}"#).unwrap();
//! assert_eq!(events[0].kind, ChangeKind::Changed);
//! assert_eq!(cache.get("k1").unwrap()["name"], "b");
//!
//! let events = cache.apply("/k1", "").unwrap();
//! assert_eq!(events[0].kind, ChangeKind::Deleted);
//! assert!(cache.is_empty());
//! ```

mod node;

pub use node::{
    decode_entries, field_matches, merge_json, merge_record, reset_at, write_at, TreeNode,
};
pub use serde_json::Value as JsonValue;

use crate::core::error::{Result, TreeError};
use crate::core::types::{ChangeEvent, Entity, Frame, Path};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cache shared between a subscription and its readers.
pub type SharedCache<T> = Arc<parking_lot::RwLock<LocalCache<T>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Collection,
    Object,
}

#[derive(Debug, Clone)]
enum Root<T> {
    Collection(BTreeMap<String, T>),
    Object(T),
}

/// Typed local mirror of a watched location.
#[derive(Debug, Clone)]
pub struct LocalCache<T> {
    root: Root<T>,
}

impl<T> LocalCache<T>
where
    T: TreeNode + Clone + Default + DeserializeOwned,
{
    /// An empty collection-mode cache.
    pub fn new() -> Self {
        LocalCache {
            root: Root::Collection(BTreeMap::new()),
        }
    }

    /// A collection-mode cache pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = (String, T)>) -> Self {
        LocalCache {
            root: Root::Collection(entries.into_iter().collect()),
        }
    }

    /// An object-mode cache whose path segments address fields of `value`.
    pub fn object(value: T) -> Self {
        LocalCache {
            root: Root::Object(value),
        }
    }

    /// Wrap for sharing with a subscription.
    pub fn shared(self) -> SharedCache<T> {
        Arc::new(parking_lot::RwLock::new(self))
    }

    pub fn mode(&self) -> CacheMode {
        match self.root {
            Root::Collection(_) => CacheMode::Collection,
            Root::Object(_) => CacheMode::Object,
        }
    }

    /// Entity stored under `key` (collection mode only).
    pub fn get(&self, key: &str) -> Option<&T> {
        match &self.root {
            Root::Collection(map) => map.get(key),
            Root::Object(_) => None,
        }
    }

    /// The root value (object mode only).
    pub fn value(&self) -> Option<&T> {
        match &self.root {
            Root::Object(value) => Some(value),
            Root::Collection(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.root {
            Root::Collection(map) => map.len(),
            Root::Object(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the top-level entities, ordered by key.
    ///
    /// Object mode yields the root value under the empty key.
    pub fn entities(&self) -> Vec<Entity<T>> {
        match &self.root {
            Root::Collection(map) => map
                .iter()
                .map(|(k, v)| Entity::new(k.clone(), v.clone()))
                .collect(),
            Root::Object(value) => vec![Entity::new("", value.clone())],
        }
    }

    /// Apply one notification.
    ///
    /// An empty or blank `payload` (or JSON `null`) deletes the top-level
    /// entity named by the first segment of `path`. Anything else is decoded
    /// and written at `path`.
    ///
    /// # Errors
    ///
    /// Decode-category errors when the payload is malformed or a segment
    /// does not resolve. The cache is unchanged in that case.
    pub fn apply(&mut self, path: &str, payload: &str) -> Result<Vec<ChangeEvent<T>>> {
        let path = Path::parse(path);

        if is_deletion(payload) {
            return self.delete(&path);
        }

        let value: Value = serde_json::from_str(payload)
            .map_err(|e| TreeError::Decode(format!("malformed payload at {}: {}", path, e)))?;

        match &mut self.root {
            Root::Collection(map) => upsert_collection(map, &path, &value),
            Root::Object(root) => upsert_object(root, &path, &value),
        }
    }

    /// Apply a decoded `put` or `patch` frame.
    ///
    /// Both kinds merge: a `put` whose payload carries every field behaves as
    /// a replace for records and leaves, and a `patch` only names the
    /// children it changes.
    pub fn apply_frame(&mut self, frame: &Frame) -> Result<Vec<ChangeEvent<T>>> {
        self.apply(&frame.path, &frame.data)
    }

    fn delete(&mut self, path: &Path) -> Result<Vec<ChangeEvent<T>>> {
        match (&mut self.root, path.first()) {
            (Root::Collection(map), None) => Ok(std::mem::take(map)
                .into_iter()
                .map(|(k, v)| ChangeEvent::deleted(k, v))
                .collect()),
            (Root::Collection(map), Some(key)) => Ok(map
                .remove(key)
                .map(|removed| ChangeEvent::deleted(key, removed))
                .into_iter()
                .collect()),
            (Root::Object(root), None) => {
                let removed = std::mem::take(root);
                Ok(vec![ChangeEvent::deleted("", removed)])
            }
            (Root::Object(root), Some(key)) => {
                let mut working = root.clone();
                reset_at(&mut working, &path.segments()[..1])?;
                *root = working;
                Ok(vec![ChangeEvent::deleted(key, root.clone())])
            }
        }
    }
}

impl<T> Default for LocalCache<T>
where
    T: TreeNode + Clone + Default + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

fn is_deletion(payload: &str) -> bool {
    let trimmed = payload.trim();
    trimmed.is_empty() || trimmed == "null"
}

fn upsert_collection<T>(
    map: &mut BTreeMap<String, T>,
    path: &Path,
    value: &Value,
) -> Result<Vec<ChangeEvent<T>>>
where
    T: TreeNode + Clone + Default + DeserializeOwned,
{
    let Some(key) = path.first() else {
        let entries = decode_entries::<T>(value)?;
        return Ok(entries
            .into_iter()
            .map(|(k, v)| {
                let existed = map.insert(k.clone(), v.clone()).is_some();
                ChangeEvent::upserted(existed, k, v)
            })
            .collect());
    };

    let existing = map.get(key);
    let existed = existing.is_some();
    let mut working = existing.cloned().unwrap_or_default();
    write_at(&mut working, path.rest(), value)?;

    map.insert(key.to_string(), working.clone());
    Ok(vec![ChangeEvent::upserted(existed, key, working)])
}

fn upsert_object<T>(root: &mut T, path: &Path, value: &Value) -> Result<Vec<ChangeEvent<T>>>
where
    T: TreeNode + Clone,
{
    let mut working = root.clone();
    write_at(&mut working, path.segments(), value)?;
    *root = working;
    Ok(vec![ChangeEvent::changed(
        path.first().unwrap_or_default(),
        root.clone(),
    )])
}
