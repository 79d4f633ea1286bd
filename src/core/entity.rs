//! Component registry with simple integer ids
//!
//! Every stateful entity (card, location) gets a stable integer identity
//! assigned from a single counter on the game state. Cross-references are
//! stored as ids and resolved through the owning store, never as pointers,
//! so cloning the state clones the whole entity graph with no aliasing.

use crate::EverdellError;
use crate::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Trait for typed component ids backed by a raw u32.
pub trait ComponentId: Copy + Eq + Hash + fmt::Debug {
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

macro_rules! define_component_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl ComponentId for $name {
            fn from_raw(raw: u32) -> Self {
                $name(raw)
            }

            fn raw(self) -> u32 {
                self.0
            }
        }

        impl $name {
            pub fn new(raw: u32) -> Self {
                $name(raw)
            }

            pub fn as_u32(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_component_id!(
    /// Identity of a card instance.
    CardId
);
define_component_id!(
    /// Identity of a board or card-companion location.
    LocationId
);

/// Base trait for all game entities
pub trait GameEntity {
    type Id: ComponentId;

    fn id(&self) -> Self::Id;
    fn display_name(&self) -> &str;
}

/// Central storage for one kind of game entity
///
/// Provides fast lookup by id. Ids are handed out by the game state's
/// unified counter, so two live entities never share one. Entities are
/// only removed on discard-free teardown paths (destination unregister);
/// a missing id on lookup is a bug, surfaced as a hard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStore<I: ComponentId, T> {
    entities: FxHashMap<I, T>,
}

impl<I, T> EntityStore<I, T>
where
    I: ComponentId + Serialize,
{
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    /// Insert an entity under its id
    pub fn insert(&mut self, id: I, entity: T) {
        self.entities.insert(id, entity);
    }

    /// Get an entity by id
    pub fn get(&self, id: I) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(EverdellError::ComponentNotFound(id.raw()))
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: I) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(EverdellError::ComponentNotFound(id.raw()))
    }

    /// Check if an entity exists
    pub fn contains(&self, id: I) -> bool {
        self.entities.contains_key(&id)
    }

    /// Remove an entity (rare - only destination-location unregister)
    pub fn remove(&mut self, id: I) -> Option<T> {
        self.entities.remove(&id)
    }

    /// Iterate over all entities
    pub fn iter(&self) -> impl Iterator<Item = (&I, &T)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<I, T> Default for EntityStore<I, T>
where
    I: ComponentId + Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_lookup() {
        let mut store: EntityStore<CardId, String> = EntityStore::new();
        let id = CardId::new(7);
        store.insert(id, "Farm".to_string());

        assert!(store.contains(id));
        assert_eq!(store.get(id).unwrap(), "Farm");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_component_is_hard_error() {
        let store: EntityStore<LocationId, u32> = EntityStore::new();
        let err = store.get(LocationId::new(42)).unwrap_err();
        match err {
            EverdellError::ComponentNotFound(raw) => assert_eq!(raw, 42),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // CardId and LocationId with the same raw value are different types;
        // this is a compile-time property, the assert just anchors the test.
        assert_eq!(CardId::new(3).as_u32(), LocationId::new(3).as_u32());
    }
}
