//! Ordered collections of related entities.

use crate::entity::Entity;
use crate::error::MapperResult;
use rowmap_store::StoreHandle;
use std::fmt;
use std::sync::Arc;

/// An ordered collection of entities, usually one side of a one-to-many
/// relation.
///
/// A collection is modified when any member is; attaching a store reaches
/// every member. Collections are built by relation loaders and consumed by
/// savers; they are never persisted directly, only through the owning
/// entity's save cascade.
#[derive(Default)]
pub struct EntityCollection {
    entries: Vec<Entity>,
}

impl EntityCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entity.
    pub fn push(&mut self, entity: Entity) {
        self.entries.push(entity);
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entity at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entries.get(index)
    }

    /// Returns the entity at `index` mutably, if present.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.entries.get_mut(index)
    }

    /// Iterates over the entities in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entries.iter()
    }

    /// Iterates mutably over the entities in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entries.iter_mut()
    }

    /// Returns true if any member reports itself modified.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.entries.iter().any(Entity::is_modified)
    }

    /// Attaches a store handle to every member.
    pub fn set_store(&mut self, store: StoreHandle) {
        for entity in &mut self.entries {
            entity.set_store(Arc::clone(&store));
        }
    }

    pub(crate) fn attach_store_if_missing(&mut self, store: &StoreHandle) {
        for entity in &mut self.entries {
            if !entity.has_store() {
                entity.set_store(Arc::clone(store));
            }
        }
    }

    /// Saves every member in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing member and propagates its error.
    pub fn save_all(&mut self) -> MapperResult<()> {
        for entity in &mut self.entries {
            entity.save()?;
        }
        Ok(())
    }
}

impl FromIterator<Entity> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EntityCollection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("len", &self.entries.len())
            .field("modified", &self.is_modified())
            .finish_non_exhaustive()
    }
}
