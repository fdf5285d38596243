//! Entity type registry.

use crate::descriptor::EntityDescriptor;
use crate::entity::Entity;
use crate::error::{MapperError, MapperResult};
use parking_lot::RwLock;
use rowmap_sql::Row;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registry of entity type descriptors.
///
/// The registry resolves bound related types when a relation is
/// materialized and snapshot type names when an entity is restored.
/// Cloning is cheap; clones share the same registrations, and an entity
/// keeps a clone so it can resolve related types for its own lifetime.
/// There is no process-wide registry: every registry is an ordinary value
/// owned by the application.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<EntityDescriptor>>>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any previous registration of the
    /// same type name.
    pub fn register(&self, descriptor: EntityDescriptor) {
        let mut types = self.inner.write();
        types.insert(descriptor.type_name().to_string(), Arc::new(descriptor));
    }

    /// Returns true if the type name is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.inner.read().contains_key(type_name)
    }

    /// Resolves a type name to its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::RelatedTypeNotFound`] if the name is not
    /// registered.
    pub fn resolve(&self, type_name: &str) -> MapperResult<Arc<EntityDescriptor>> {
        self.inner
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| MapperError::related_type_not_found(type_name))
    }

    /// Creates an empty entity of the named type.
    ///
    /// All fields start at NULL and the baseline is captured, so a fresh
    /// entity reports itself unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::RelatedTypeNotFound`] if the name is not
    /// registered.
    pub fn create(&self, type_name: &str) -> MapperResult<Entity> {
        let descriptor = self.resolve(type_name)?;
        Ok(Entity::new(descriptor, self.clone()))
    }

    /// Creates an entity of the named type hydrated from a data row.
    ///
    /// Fields present in the row are populated with type-directed
    /// conversion, then the baseline is captured.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::RelatedTypeNotFound`] if the name is not
    /// registered, or a conversion error if a row value does not fit its
    /// declared field type.
    pub fn create_from_row(&self, type_name: &str, row: &Row) -> MapperResult<Entity> {
        let descriptor = self.resolve(type_name)?;
        Entity::from_row(descriptor, self.clone(), row)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.inner.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmap_sql::{SqlType, SqlValue};

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
        registry
    }

    #[test]
    fn resolve_unknown_type_fails() {
        let registry = registry();
        let err = registry.resolve("Ghost").unwrap_err();
        assert!(matches!(err, MapperError::RelatedTypeNotFound { .. }));
    }

    #[test]
    fn create_starts_unmodified() {
        let registry = registry();
        let author = registry.create("Author").unwrap();
        assert!(!author.is_modified());
        assert!(author.get("id").unwrap().is_null());
    }

    #[test]
    fn create_from_row_hydrates() {
        let registry = registry();
        let row = Row::from([
            ("id", SqlValue::Integer(3)),
            ("name", SqlValue::from("Jo")),
        ]);
        let author = registry.create_from_row("Author", &row).unwrap();
        assert_eq!(author.get("name").unwrap(), &SqlValue::from("Jo"));
        assert!(!author.is_modified());
    }

    #[test]
    fn clones_share_registrations() {
        let registry = registry();
        let clone = registry.clone();
        assert!(clone.contains("Author"));

        clone.register(
            EntityDescriptor::builder("Tag")
                .field("label", SqlType::Text)
                .build()
                .unwrap(),
        );
        assert!(registry.contains("Tag"));
    }
}
