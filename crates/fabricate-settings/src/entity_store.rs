//! Keyed entity stores with reverse-lookup collections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Builds a collection key such as `craftingSystem.alchemy`.
#[must_use]
pub fn collection_key(prefix: &str, id: &str) -> String {
    format!("{prefix}.{id}")
}

/// Persisted store of one entity type.
///
/// `collections` maps a lookup key (owning crafting system, source item) to
/// the ids of the entities filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDataStore<J> {
    /// Entities by id
    pub entities: BTreeMap<String, J>,
    /// Entity ids by collection key
    pub collections: BTreeMap<String, Vec<String>>,
}

impl<J> Default for EntityDataStore<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J> EntityDataStore<J> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }

    /// Inserts an entity and files its id under every collection key.
    ///
    /// An id is listed at most once per collection.
    pub fn insert<I>(&mut self, id: impl Into<String>, entity: J, collection_keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        let id = id.into();
        for key in collection_keys {
            let ids = self.collections.entry(key).or_default();
            if !ids.contains(&id) {
                ids.push(id.clone());
            }
        }
        self.entities.insert(id, entity);
    }

    /// Entity with the id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&J> {
        self.entities.get(id)
    }

    /// Ids filed under the key, in insertion order.
    #[must_use]
    pub fn collection(&self, key: &str) -> &[String] {
        self.collections.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
