//! The persistent entity.

use crate::descriptor::EntityDescriptor;
use crate::error::{MapperError, MapperResult};
use crate::fingerprint::{fingerprint_value, Fingerprint};
use crate::registry::TypeRegistry;
use crate::relation::Related;
use rowmap_sql::{Row, SqlValue};
use rowmap_store::StoreHandle;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An object mapped to one relational row.
///
/// An entity is a dynamic record configured by an [`EntityDescriptor`]:
/// declared fields correspond 1:1 to columns and are addressed by name;
/// internal fields hold foreign keys and are addressed as relations. The
/// entity tracks a fingerprint baseline for every field so it knows what
/// changed since the last load or save, caches lazily materialized related
/// entities, and persists itself (and its autosaved relations) in one
/// transaction per [`save`](Self::save).
///
/// Instances are created through a [`TypeRegistry`]:
///
/// ```
/// use rowmap_core::{EntityDescriptor, TypeRegistry};
/// use rowmap_sql::SqlType;
///
/// let registry = TypeRegistry::new();
/// registry.register(
///     EntityDescriptor::builder("Article")
///         .table("article")
///         .id_field("id")
///         .field("id", SqlType::Integer)
///         .field("title", SqlType::Text)
///         .build()
///         .unwrap(),
/// );
///
/// let mut article = registry.create("Article").unwrap();
/// article.set("title", "Hello").unwrap();
/// assert!(article.is_modified());
/// ```
///
/// One entity instance belongs to one logical task at a time; concurrent
/// access to the same row takes separate instances over the same store.
pub struct Entity {
    pub(crate) descriptor: Arc<EntityDescriptor>,
    pub(crate) registry: TypeRegistry,
    pub(crate) store: Option<StoreHandle>,
    pub(crate) values: HashMap<String, SqlValue>,
    pub(crate) internal: HashMap<String, SqlValue>,
    pub(crate) baselines: HashMap<String, Fingerprint>,
    pub(crate) relations: HashMap<String, Related>,
}

impl Entity {
    pub(crate) fn new(descriptor: Arc<EntityDescriptor>, registry: TypeRegistry) -> Self {
        let mut entity = Self {
            values: descriptor
                .fields()
                .iter()
                .map(|f| (f.name().to_string(), SqlValue::Null))
                .collect(),
            internal: descriptor
                .internal_fields()
                .iter()
                .map(|f| (f.name().to_string(), SqlValue::Null))
                .collect(),
            baselines: HashMap::new(),
            relations: HashMap::new(),
            store: None,
            descriptor,
            registry,
        };
        entity.rebaseline();
        entity
    }

    pub(crate) fn from_row(
        descriptor: Arc<EntityDescriptor>,
        registry: TypeRegistry,
        row: &Row,
    ) -> MapperResult<Self> {
        let mut entity = Self::new(descriptor, registry);
        entity.hydrate(row)?;
        entity.rebaseline();
        Ok(entity)
    }

    /// Returns this entity's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.descriptor.type_name()
    }

    /// Returns the registry this entity resolves related types through.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // === fields ===

    /// Returns the current value of a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownProperty`] if the name is not a
    /// declared field.
    pub fn get(&self, name: &str) -> MapperResult<&SqlValue> {
        self.values
            .get(name)
            .ok_or_else(|| MapperError::unknown_property(self.type_name(), name))
    }

    /// Sets a declared field, or the key of an internal field.
    ///
    /// Setting an internal field's key directly does not materialize or
    /// replace its cached relation; materialization stays lazy.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnknownProperty`] if the name is neither a
    /// declared field nor an internal field.
    pub fn set(&mut self, name: &str, value: impl Into<SqlValue>) -> MapperResult<()> {
        let value = value.into();
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        if let Some(slot) = self.internal.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        Err(MapperError::unknown_property(self.type_name(), name))
    }

    /// Returns true if `name` is a declared field of this type.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.descriptor.has_field(name)
    }

    /// Returns the current key of an internal field, or `None` if the
    /// name is not a registered internal field.
    #[must_use]
    pub fn internal_value(&self, name: &str) -> Option<&SqlValue> {
        self.internal.get(name)
    }

    /// Returns true if `name` is a registered internal field.
    #[must_use]
    pub fn has_internal_value(&self, name: &str) -> bool {
        self.internal.contains_key(name)
    }

    /// Returns the current value of the id field, or NULL when the type
    /// has no id field or the entity was never saved or loaded.
    #[must_use]
    pub fn id_value(&self) -> SqlValue {
        self.descriptor
            .id_field()
            .and_then(|id_field| self.values.get(id_field))
            .cloned()
            .unwrap_or(SqlValue::Null)
    }

    pub(crate) fn hydrate(&mut self, row: &Row) -> MapperResult<()> {
        let descriptor = Arc::clone(&self.descriptor);
        for field in descriptor.fields() {
            if let Some(value) = row.get(field.name()) {
                let value = value.coerce(field.sql_type())?;
                self.values.insert(field.name().to_string(), value);
            }
        }
        for field in descriptor.internal_fields() {
            if let Some(value) = row.get(field.name()) {
                self.internal.insert(field.name().to_string(), value.clone());
            }
        }
        Ok(())
    }

    // === store attachment ===

    /// Attaches a store handle.
    ///
    /// The handle is propagated to every cached relation named in the
    /// serializable whitelist, so a restored entity graph comes back to
    /// life with one call.
    pub fn set_store(&mut self, store: StoreHandle) {
        for name in self.descriptor.serializable_relations() {
            if let Some(related) = self.relations.get_mut(name) {
                related.set_store(Arc::clone(&store));
            }
        }
        self.store = Some(store);
    }

    /// Returns true if a store handle is attached.
    #[must_use]
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Returns the attached store handle.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NoStoreAttached`] if none is attached.
    pub fn store(&self) -> MapperResult<&StoreHandle> {
        self.store
            .as_ref()
            .ok_or_else(|| MapperError::no_store_attached(self.type_name()))
    }

    // === change tracking ===

    /// Iterates every tracked field (declared, then internal) with its
    /// current value, in declaration order.
    fn tracked_values(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        static NULL: SqlValue = SqlValue::Null;
        let declared = self
            .descriptor
            .fields()
            .iter()
            .map(|f| (f.name(), self.values.get(f.name()).unwrap_or(&NULL)));
        let internal = self
            .descriptor
            .internal_fields()
            .iter()
            .map(|f| (f.name(), self.internal.get(f.name()).unwrap_or(&NULL)));
        declared.chain(internal)
    }

    /// Recomputes the fingerprint baseline for every tracked field.
    pub(crate) fn rebaseline(&mut self) {
        let baselines: HashMap<String, Fingerprint> = self
            .tracked_values()
            .map(|(name, value)| (name.to_string(), fingerprint_value(value)))
            .collect();
        self.baselines = baselines;
    }

    /// Returns true if this entity changed since it was loaded or saved.
    ///
    /// A cached relation that reports itself modified makes the owner
    /// modified too, whether or not any of the owner's own fields changed.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        let fields_changed = self.tracked_values().any(|(name, value)| {
            self.baselines.get(name) != Some(&fingerprint_value(value))
        });
        fields_changed || self.relations.values().any(Related::is_modified)
    }

    /// Returns the tracked fields whose value changed since the baseline,
    /// in declaration order. This is exactly the write set of an update.
    #[must_use]
    pub fn modified_fields(&self) -> Vec<(String, SqlValue)> {
        self.tracked_values()
            .filter(|(name, value)| self.baselines.get(*name) != Some(&fingerprint_value(value)))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type_name", &self.type_name())
            .field("table", &self.descriptor.table())
            .field("id", &self.id_value())
            .field("modified", &self.is_modified())
            .finish_non_exhaustive()
    }
}
