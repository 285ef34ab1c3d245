//! Change notifications emitted by the local cache.

use crate::core::types::Entity;

/// What happened to a top-level entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Changed,
    Deleted,
}

/// A change to one top-level entity.
///
/// The cache stays the canonical holder of the value; the event carries a
/// copy taken right after the change was applied (or, for deletions, the
/// value that was removed).
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<T> {
    pub kind: ChangeKind,
    pub entity: Entity<T>,
}

impl<T> ChangeEvent<T> {
    pub fn new(kind: ChangeKind, key: impl Into<String>, value: T) -> Self {
        ChangeEvent {
            kind,
            entity: Entity::new(key, value),
        }
    }

    pub fn added(key: impl Into<String>, value: T) -> Self {
        Self::new(ChangeKind::Added, key, value)
    }

    pub fn changed(key: impl Into<String>, value: T) -> Self {
        Self::new(ChangeKind::Changed, key, value)
    }

    pub fn deleted(key: impl Into<String>, value: T) -> Self {
        Self::new(ChangeKind::Deleted, key, value)
    }

    /// `Changed` if the key was already present, `Added` otherwise.
    pub(crate) fn upserted(existed: bool, key: impl Into<String>, value: T) -> Self {
        if existed {
            Self::changed(key, value)
        } else {
            Self::added(key, value)
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        self.entity.key()
    }

    #[inline]
    pub fn value(&self) -> &T {
        self.entity.value()
    }
}
