//! Relation resolution and the sub-object cache.
//!
//! A relation name resolves against an entity in a fixed order: the
//! instance cache first, then a registered loader, then a registered
//! internal field (materialized through the bound related type). A name
//! that matches none of these is an [`UnknownProperty`] error - never a
//! silent `None`.
//!
//! [`UnknownProperty`]: crate::MapperError::UnknownProperty

use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::error::{MapperError, MapperResult};
use rowmap_sql::SqlValue;
use rowmap_store::StoreHandle;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A materialized related value: a single entity or a collection.
pub enum Related {
    /// A single related entity.
    Entity(Box<Entity>),
    /// A collection of related entities.
    Collection(EntityCollection),
}

impl Related {
    /// Returns true if the related value reports itself modified.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        match self {
            Self::Entity(entity) => entity.is_modified(),
            Self::Collection(collection) => collection.is_modified(),
        }
    }

    /// Attaches a store handle, replacing any previous one.
    pub fn set_store(&mut self, store: StoreHandle) {
        match self {
            Self::Entity(entity) => entity.set_store(store),
            Self::Collection(collection) => collection.set_store(store),
        }
    }

    /// Attaches a store handle only where none is attached yet.
    pub(crate) fn attach_store_if_missing(&mut self, store: &StoreHandle) {
        match self {
            Self::Entity(entity) => {
                if !entity.has_store() {
                    entity.set_store(Arc::clone(store));
                }
            }
            Self::Collection(collection) => collection.attach_store_if_missing(store),
        }
    }

    pub(crate) fn save(&mut self) -> MapperResult<()> {
        match self {
            Self::Entity(entity) => entity.save(),
            Self::Collection(collection) => collection.save_all(),
        }
    }

    pub(crate) fn id_value(&self) -> SqlValue {
        match self {
            Self::Entity(entity) => entity.id_value(),
            Self::Collection(_) => SqlValue::Null,
        }
    }

    /// Returns the entity, if this is a single related entity.
    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Collection(_) => None,
        }
    }

    /// Returns the entity mutably, if this is a single related entity.
    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            Self::Collection(_) => None,
        }
    }

    /// Returns the collection, if this is a related collection.
    #[must_use]
    pub fn as_collection(&self) -> Option<&EntityCollection> {
        match self {
            Self::Entity(_) => None,
            Self::Collection(collection) => Some(collection),
        }
    }

    /// Returns the collection mutably, if this is a related collection.
    pub fn as_collection_mut(&mut self) -> Option<&mut EntityCollection> {
        match self {
            Self::Entity(_) => None,
            Self::Collection(collection) => Some(collection),
        }
    }
}

impl From<Entity> for Related {
    fn from(entity: Entity) -> Self {
        Self::Entity(Box::new(entity))
    }
}

impl From<EntityCollection> for Related {
    fn from(collection: EntityCollection) -> Self {
        Self::Collection(collection)
    }
}

impl fmt::Debug for Related {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(entity) => f.debug_tuple("Related::Entity").field(entity).finish(),
            Self::Collection(collection) => {
                f.debug_tuple("Related::Collection").field(collection).finish()
            }
        }
    }
}

impl Entity {
    /// Returns the related value for a relation name, materializing it on
    /// first access.
    ///
    /// Resolution order: the cache, then a registered loader, then a
    /// registered internal field. An internal field with a NULL key
    /// resolves to `Ok(None)` without touching the store; a non-null key
    /// constructs the bound related type, attaches this entity's store,
    /// loads it by the key and caches the result.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownProperty`] if the name cannot be
    /// resolved, [`MapperError::RelatedTypeNotFound`] if the bound type is
    /// not registered, and [`MapperError::NoStoreAttached`] if
    /// materialization needs a store and none is attached.
    pub fn related(&mut self, name: &str) -> MapperResult<Option<&Related>> {
        if self.relations.contains_key(name) {
            return Ok(self.relations.get(name));
        }

        if let Some(loader) = self.descriptor.loader(name).cloned() {
            self.store()?;
            let mut value = (*loader)(self)?;
            if let Some(store) = &self.store {
                value.attach_store_if_missing(store);
            }
            trace!(type_name = self.type_name(), relation = name, "loaded relation");
            self.relations.insert(name.to_string(), value);
            return Ok(self.relations.get(name));
        }

        let bound = self
            .descriptor
            .internal_field(name)
            .map(|f| f.related_type().map(str::to_string));
        if let Some(bound) = bound {
            let key = self.internal.get(name).cloned().unwrap_or(SqlValue::Null);
            if key.is_null() {
                return Ok(None);
            }
            if let Some(type_name) = bound {
                let store = Arc::clone(self.store()?);
                let descriptor = self.registry.resolve(&type_name)?;
                let mut object = Entity::new(descriptor, self.registry.clone());
                object.set_store(store);
                object.load(key)?;
                trace!(
                    type_name = self.type_name(),
                    relation = name,
                    related_type = type_name.as_str(),
                    "materialized relation"
                );
                self.relations
                    .insert(name.to_string(), Related::Entity(Box::new(object)));
                return Ok(self.relations.get(name));
            }
            // Non-null key with no bound type: nothing to materialize with.
        }

        Err(MapperError::unknown_property(self.type_name(), name))
    }

    /// Assigns a related value to a relation name.
    ///
    /// A loader-backed relation caches the assigned value directly - the
    /// assignment is the source of truth. An internal field caches the
    /// entity and copies its id into the key; the key is NULL when the
    /// assigned entity has not been saved yet, and the pre-save cascade
    /// fills it in. If this entity has a store and the assigned value does
    /// not, the store is attached.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownProperty`] if the name is neither
    /// loader-backed nor internal, and [`MapperError::InvalidOperation`]
    /// when a collection is assigned to an internal field.
    pub fn set_related(&mut self, name: &str, value: impl Into<Related>) -> MapperResult<()> {
        let mut value = value.into();
        if let Some(store) = &self.store {
            value.attach_store_if_missing(store);
        }

        if self.descriptor.loader(name).is_some() {
            self.relations.insert(name.to_string(), value);
            return Ok(());
        }

        if self.descriptor.has_internal(name) {
            if matches!(value, Related::Collection(_)) {
                return Err(MapperError::invalid_operation(format!(
                    "cannot assign a collection to internal field '{name}' on {}",
                    self.type_name()
                )));
            }
            let key = value.id_value();
            self.relations.insert(name.to_string(), value);
            self.internal.insert(name.to_string(), key);
            return Ok(());
        }

        Err(MapperError::unknown_property(self.type_name(), name))
    }

    /// Returns true if the name resolves to a relation, without
    /// materializing anything.
    #[must_use]
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
            || self.descriptor.loader(name).is_some()
            || self.descriptor.has_internal(name)
    }

    /// Returns the cached related value, if one is cached.
    #[must_use]
    pub fn relation_cached(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    /// Returns the cached related value mutably, if one is cached.
    pub fn relation_cached_mut(&mut self, name: &str) -> Option<&mut Related> {
        self.relations.get_mut(name)
    }
}
