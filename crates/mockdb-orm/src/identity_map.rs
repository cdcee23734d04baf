//! Identity map: at most one live model instance per (type, id).
//!
//! Within a session, every lookup of the same record must yield the same
//! instance so that mutations are visible everywhere that record is
//! referenced. Entries hold `Arc<RwLock<ModelState>>`; handing out clones of
//! the same `Arc` is what makes two lookups reference-equal.
//!
//! Entries are created on first resolution, evicted on destroy, and cleared
//! wholesale at session teardown.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mockdb_core::Id;

use crate::model::ModelState;

/// Composite key: model type tag plus integer id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    /// Model type name.
    pub model: String,
    /// Record id within that type's collection.
    pub id: Id,
}

impl ModelKey {
    /// Create a key for the given type and id.
    #[must_use]
    pub fn new(model: impl Into<String>, id: Id) -> Self {
        Self {
            model: model.into(),
            id,
        }
    }
}

/// Session-scoped cache of live model states.
#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<ModelKey, Arc<RwLock<ModelState>>>,
}

impl IdentityMap {
    /// Create a new empty identity map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Cache a model state under its key. If the key already has an entry,
    /// the existing entry wins and is returned; the caller must adopt it.
    pub fn insert(
        &mut self,
        key: ModelKey,
        state: Arc<RwLock<ModelState>>,
    ) -> Arc<RwLock<ModelState>> {
        Arc::clone(self.entries.entry(key).or_insert(state))
    }

    /// Look up the cached state for a key. The returned `Arc` is a clone of
    /// the stored one, so all callers share the same instance.
    #[must_use]
    pub fn get(&self, key: &ModelKey) -> Option<Arc<RwLock<ModelState>>> {
        self.entries.get(key).map(Arc::clone)
    }

    /// Check whether a key has a cached entry.
    #[must_use]
    pub fn contains(&self, key: &ModelKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Evict the entry for a key (on destroy). Returns `true` if an entry
    /// was present.
    pub fn remove(&mut self, key: &ModelKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Clear all entries (session teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
