//! Entity snapshots for out-of-band transport.
//!
//! A snapshot is the serializable form of an entity: its field values,
//! internal keys, fingerprint baselines, and the whitelisted cached
//! relations - nothing else. The store handle never travels, and cached
//! relations outside the type's serializable whitelist are dropped, so a
//! snapshot cannot accidentally freeze a whole lazily-loaded object graph.
//!
//! Restoring goes through a [`TypeRegistry`], which resolves the type name
//! back to a descriptor. A restored entity has no store; persistence and
//! relation loading fail with [`NoStoreAttached`] until the caller
//! reattaches one.
//!
//! [`NoStoreAttached`]: crate::MapperError::NoStoreAttached

use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::error::MapperResult;
use crate::fingerprint::Fingerprint;
use crate::registry::TypeRegistry;
use crate::relation::Related;
use rowmap_sql::SqlValue;
use serde::{Deserialize, Serialize};

/// The serializable form of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// The entity type name, resolved through the registry on restore.
    pub type_name: String,
    /// Declared field values in declaration order.
    pub fields: Vec<(String, SqlValue)>,
    /// Internal field keys in declaration order.
    pub internal: Vec<(String, SqlValue)>,
    /// Fingerprint baselines, so a restored entity is re-comparable
    /// without a reload.
    pub baselines: Vec<(String, Fingerprint)>,
    /// Whitelisted cached relations.
    pub relations: Vec<(String, RelatedSnapshot)>,
}

/// The serializable form of a cached relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelatedSnapshot {
    /// A single related entity.
    Entity(EntitySnapshot),
    /// A collection of related entities.
    Collection(Vec<EntitySnapshot>),
}

impl Entity {
    /// Produces the serializable snapshot of this entity.
    ///
    /// The live entity is left untouched; the snapshot simply omits what
    /// must not travel (the store handle, non-whitelisted relations).
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        let fields = self
            .descriptor
            .fields()
            .iter()
            .map(|f| {
                (
                    f.name().to_string(),
                    self.values.get(f.name()).cloned().unwrap_or(SqlValue::Null),
                )
            })
            .collect();
        let internal = self
            .descriptor
            .internal_fields()
            .iter()
            .map(|f| {
                (
                    f.name().to_string(),
                    self.internal
                        .get(f.name())
                        .cloned()
                        .unwrap_or(SqlValue::Null),
                )
            })
            .collect();

        let baselines = self
            .descriptor
            .fields()
            .iter()
            .map(|f| f.name())
            .chain(self.descriptor.internal_fields().iter().map(|f| f.name()))
            .filter_map(|name| {
                self.baselines
                    .get(name)
                    .map(|fingerprint| (name.to_string(), *fingerprint))
            })
            .collect();

        let mut relations = Vec::new();
        for name in self.descriptor.serializable_relations() {
            if let Some(related) = self.relations.get(name) {
                let snapshot = match related {
                    Related::Entity(entity) => RelatedSnapshot::Entity(entity.snapshot()),
                    Related::Collection(collection) => RelatedSnapshot::Collection(
                        collection.iter().map(Entity::snapshot).collect(),
                    ),
                };
                relations.push((name.clone(), snapshot));
            }
        }

        EntitySnapshot {
            type_name: self.type_name().to_string(),
            fields,
            internal,
            baselines,
            relations,
        }
    }
}

impl TypeRegistry {
    /// Rebuilds an entity from a snapshot.
    ///
    /// Field names the current descriptor no longer declares are skipped.
    /// The restored entity has no store attached; relations named in the
    /// snapshot are restored recursively.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::RelatedTypeNotFound`] if the snapshot's type
    /// name (or a nested relation's) is not registered.
    ///
    /// [`MapperError::RelatedTypeNotFound`]: crate::MapperError::RelatedTypeNotFound
    pub fn restore(&self, snapshot: &EntitySnapshot) -> MapperResult<Entity> {
        let descriptor = self.resolve(&snapshot.type_name)?;
        let mut entity = Entity::new(descriptor, self.clone());

        for (name, value) in &snapshot.fields {
            if entity.values.contains_key(name) {
                entity.values.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in &snapshot.internal {
            if entity.internal.contains_key(name) {
                entity.internal.insert(name.clone(), value.clone());
            }
        }

        entity.rebaseline();
        for (name, fingerprint) in &snapshot.baselines {
            if entity.baselines.contains_key(name) {
                entity.baselines.insert(name.clone(), *fingerprint);
            }
        }

        for (name, related) in &snapshot.relations {
            if !entity.descriptor.is_serializable(name) {
                continue;
            }
            let related = match related {
                RelatedSnapshot::Entity(snapshot) => {
                    Related::Entity(Box::new(self.restore(snapshot)?))
                }
                RelatedSnapshot::Collection(members) => {
                    let mut collection = EntityCollection::new();
                    for member in members {
                        collection.push(self.restore(member)?);
                    }
                    Related::Collection(collection)
                }
            };
            entity.relations.insert(name.clone(), related);
        }

        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::EntityDescriptor;
    use crate::error::MapperError;
    use rowmap_sql::{SqlType, SqlValue};
    use rowmap_store::{InMemoryStore, StoreBackend, StoreHandle};
    use std::sync::Arc;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(
            EntityDescriptor::builder("Author")
                .table("author")
                .id_field("id")
                .field("id", SqlType::Integer)
                .field("name", SqlType::Text)
                .build()
                .unwrap(),
        );
        registry.register(
            EntityDescriptor::builder("Article")
                .table("article")
                .id_field("id")
                .field("id", SqlType::Integer)
                .field("title", SqlType::Text)
                .internal_bound("author", "Author", true)
                .internal_bound("reviewer", "Author", false)
                .serializable("author")
                .build()
                .unwrap(),
        );
        registry
    }

    fn store_with_authors() -> StoreHandle {
        let store = InMemoryStore::new();
        for name in ["Jo", "Sam"] {
            store
                .insert(
                    "author",
                    &[("name".to_string(), SqlValue::from(name))],
                    Some("id"),
                )
                .unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn snapshot_keeps_whitelisted_relations_only() {
        let registry = registry();
        let store = store_with_authors();

        let mut article = registry.create("Article").unwrap();
        article.set_store(store);
        article.set("title", "Hello").unwrap();
        article.set("author", 1i64).unwrap();
        article.set("reviewer", 2i64).unwrap();

        // Materialize both; only `author` is whitelisted.
        article.related("author").unwrap();
        article.related("reviewer").unwrap();

        let snapshot = article.snapshot();
        assert_eq!(snapshot.relations.len(), 1);
        assert_eq!(snapshot.relations[0].0, "author");
        // The reviewer key still travels; only the cached object is dropped.
        assert!(snapshot
            .internal
            .iter()
            .any(|(name, value)| name == "reviewer" && value == &SqlValue::Integer(2)));
    }

    #[test]
    fn restore_preserves_values_and_modified_state() {
        let registry = registry();
        let store = store_with_authors();

        let mut article = registry.create("Article").unwrap();
        article.set_store(store);
        article.set("title", "Hello").unwrap();
        article.save().unwrap();
        article.set("title", "Changed").unwrap();

        let restored = registry.restore(&article.snapshot()).unwrap();
        assert_eq!(restored.get("title").unwrap(), &SqlValue::from("Changed"));
        assert!(restored.is_modified());
        assert_eq!(
            restored.modified_fields(),
            vec![("title".to_string(), SqlValue::from("Changed"))]
        );
    }

    #[test]
    fn restored_entity_has_no_store() {
        let registry = registry();
        let store = store_with_authors();

        let mut article = registry.create("Article").unwrap();
        article.set_store(store);
        article.set("author", 1i64).unwrap();
        article.related("author").unwrap();

        let mut restored = registry.restore(&article.snapshot()).unwrap();
        assert!(!restored.has_store());
        assert!(matches!(
            restored.save().unwrap_err(),
            MapperError::NoStoreAttached { .. }
        ));

        // The cached relation survived the round trip, storeless.
        let author = restored.relation_cached("author").unwrap().as_entity().unwrap();
        assert!(!author.has_store());
    }

    #[test]
    fn set_store_revives_whitelisted_relations() {
        let registry = registry();
        let store = store_with_authors();

        let mut article = registry.create("Article").unwrap();
        article.set_store(Arc::clone(&store));
        article.set("author", 1i64).unwrap();
        article.related("author").unwrap();

        let mut restored = registry.restore(&article.snapshot()).unwrap();
        restored.set_store(store);

        let author = restored.relation_cached("author").unwrap().as_entity().unwrap();
        assert!(author.has_store());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let registry = registry();
        let mut article = registry.create("Article").unwrap();
        article.set("title", "Hello").unwrap();

        let snapshot = article.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: EntitySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);

        let restored = registry.restore(&back).unwrap();
        assert_eq!(restored.get("title").unwrap(), &SqlValue::from("Hello"));
    }

    #[test]
    fn restore_of_unknown_type_fails() {
        let registry = registry();
        let snapshot = EntitySnapshot {
            type_name: "Ghost".to_string(),
            fields: Vec::new(),
            internal: Vec::new(),
            baselines: Vec::new(),
            relations: Vec::new(),
        };
        assert!(matches!(
            registry.restore(&snapshot).unwrap_err(),
            MapperError::RelatedTypeNotFound { .. }
        ));
    }
}
