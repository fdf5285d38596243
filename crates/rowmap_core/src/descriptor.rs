//! Entity type descriptors.
//!
//! A descriptor is the statically declared schema of an entity type: its
//! table and id field, the declared fields that correspond 1:1 to columns,
//! the internal (foreign-key) fields with their bound types and autosave
//! flags, and the registered relation loaders and savers. Descriptors are
//! built once per type and shared by every instance through an `Arc`.

use crate::entity::Entity;
use crate::error::{MapperError, MapperResult};
use crate::relation::Related;
use rowmap_sql::SqlType;
use std::fmt;
use std::sync::Arc;

/// A relation loader: produces the related value for one relation name.
///
/// Loaders are the escape hatch for relations that are not simple foreign
/// keys - joins, child collections, computed views. The mapper invokes the
/// loader at most once per instance; the result is cached.
pub type LoaderFn = Arc<dyn Fn(&mut Entity) -> MapperResult<Related> + Send + Sync>;

/// A relation saver: persists one cached relation after the owning entity
/// has been written.
///
/// Savers run in the post-save cascade, when the owner's id is known; a
/// child row that needs the parent's key reads it from the entity passed
/// in.
pub type SaverFn = Arc<dyn Fn(&mut Entity) -> MapperResult<()> + Send + Sync>;

/// A declared field: one column of the backing table.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    sql_type: SqlType,
}

impl FieldDescriptor {
    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared column type.
    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }
}

/// An internal field: a foreign-key slot addressed by relation name.
#[derive(Debug, Clone)]
pub struct InternalField {
    name: String,
    related_type: Option<String>,
    autosave: bool,
}

impl InternalField {
    /// Returns the relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bound related type name, if one was registered.
    #[must_use]
    pub fn related_type(&self) -> Option<&str> {
        self.related_type.as_deref()
    }

    /// Returns true if the related entity is saved automatically before
    /// the owner.
    #[must_use]
    pub fn autosave(&self) -> bool {
        self.autosave
    }
}

/// The declared persistence schema of an entity type.
pub struct EntityDescriptor {
    type_name: String,
    table: Option<String>,
    id_field: Option<String>,
    fields: Vec<FieldDescriptor>,
    internal: Vec<InternalField>,
    loaders: Vec<(String, LoaderFn)>,
    savers: Vec<(String, SaverFn)>,
    serializable: Vec<String>,
}

impl EntityDescriptor {
    /// Starts building a descriptor for the named entity type.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            type_name: type_name.into(),
            table: None,
            id_field: None,
            fields: Vec::new(),
            internal: Vec::new(),
            loaders: Vec::new(),
            savers: Vec::new(),
            serializable: Vec::new(),
        }
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the backing table name, if the type is independently
    /// persisted.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns the primary-key field name, if set.
    #[must_use]
    pub fn id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    /// Returns the declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the declared field of this name, if any.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if `name` is a declared field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the internal fields in declaration order.
    #[must_use]
    pub fn internal_fields(&self) -> &[InternalField] {
        &self.internal
    }

    /// Returns the internal field of this name, if any.
    #[must_use]
    pub fn internal_field(&self, name: &str) -> Option<&InternalField> {
        self.internal.iter().find(|f| f.name == name)
    }

    /// Returns true if `name` is a registered internal field.
    #[must_use]
    pub fn has_internal(&self, name: &str) -> bool {
        self.internal_field(name).is_some()
    }

    /// Returns the registered loader for a relation name, if any.
    #[must_use]
    pub fn loader(&self, name: &str) -> Option<&LoaderFn> {
        self.loaders
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    /// Returns the registered savers in registration order.
    pub(crate) fn savers(&self) -> &[(String, SaverFn)] {
        &self.savers
    }

    /// Returns the serializable-relation whitelist in registration order.
    #[must_use]
    pub fn serializable_relations(&self) -> &[String] {
        &self.serializable
    }

    /// Returns true if the named relation travels with snapshots.
    #[must_use]
    pub fn is_serializable(&self, name: &str) -> bool {
        self.serializable.iter().any(|n| n == name)
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("type_name", &self.type_name)
            .field("table", &self.table)
            .field("id_field", &self.id_field)
            .field("fields", &self.fields)
            .field("internal", &self.internal)
            .field("loaders", &self.loaders.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("savers", &self.savers.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("serializable", &self.serializable)
            .finish()
    }
}

/// Builder for [`EntityDescriptor`].
pub struct DescriptorBuilder {
    type_name: String,
    table: Option<String>,
    id_field: Option<String>,
    fields: Vec<FieldDescriptor>,
    internal: Vec<InternalField>,
    loaders: Vec<(String, LoaderFn)>,
    savers: Vec<(String, SaverFn)>,
    serializable: Vec<String>,
}

impl DescriptorBuilder {
    /// Sets the backing table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the primary-key field name.
    #[must_use]
    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = Some(id_field.into());
        self
    }

    /// Declares a field of the given column type.
    ///
    /// Declaration order is the field order everywhere: fingerprints,
    /// write sets, snapshots.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, sql_type: SqlType) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            sql_type,
        });
        self
    }

    /// Registers an internal field with no bound type.
    ///
    /// The key value is tracked and persisted, but the relation cannot be
    /// materialized unless a loader is also registered.
    #[must_use]
    pub fn internal(mut self, name: impl Into<String>) -> Self {
        self.internal.push(InternalField {
            name: name.into(),
            related_type: None,
            autosave: false,
        });
        self
    }

    /// Registers an internal field bound to a related entity type.
    ///
    /// With `autosave` set, a cached related entity is saved before the
    /// owner so the owner can store its key.
    #[must_use]
    pub fn internal_bound(
        mut self,
        name: impl Into<String>,
        related_type: impl Into<String>,
        autosave: bool,
    ) -> Self {
        self.internal.push(InternalField {
            name: name.into(),
            related_type: Some(related_type.into()),
            autosave,
        });
        self
    }

    /// Registers a relation loader.
    #[must_use]
    pub fn loader<F>(mut self, name: impl Into<String>, loader: F) -> Self
    where
        F: Fn(&mut Entity) -> MapperResult<Related> + Send + Sync + 'static,
    {
        self.loaders.push((name.into(), Arc::new(loader)));
        self
    }

    /// Registers a relation saver, run in the post-save cascade.
    #[must_use]
    pub fn saver<F>(mut self, name: impl Into<String>, saver: F) -> Self
    where
        F: Fn(&mut Entity) -> MapperResult<()> + Send + Sync + 'static,
    {
        self.savers.push((name.into(), Arc::new(saver)));
        self
    }

    /// Whitelists a relation for serialization.
    ///
    /// Cached relations outside this list are dropped from snapshots.
    #[must_use]
    pub fn serializable(mut self, name: impl Into<String>) -> Self {
        self.serializable.push(name.into());
        self
    }

    /// Finishes the descriptor, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidDescriptor`] if a name is declared
    /// twice or is both a field and an internal field, if the id field is
    /// not declared, if a loader shadows a declared field, or if a saver
    /// or serializable entry names a relation that cannot be addressed.
    pub fn build(self) -> MapperResult<EntityDescriptor> {
        let fail =
            |message: String| Err(MapperError::invalid_descriptor(self.type_name.as_str(), message));

        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return fail(format!("field '{}' declared twice", field.name));
            }
        }
        for (i, internal) in self.internal.iter().enumerate() {
            if self.internal[..i].iter().any(|f| f.name == internal.name) {
                return fail(format!("internal field '{}' registered twice", internal.name));
            }
            if self.fields.iter().any(|f| f.name == internal.name) {
                return fail(format!(
                    "'{}' is both a declared field and an internal field",
                    internal.name
                ));
            }
        }

        if let Some(id_field) = &self.id_field {
            if !self.fields.iter().any(|f| &f.name == id_field) {
                return fail(format!("id field '{id_field}' is not a declared field"));
            }
        }

        for (i, (name, _)) in self.loaders.iter().enumerate() {
            if self.loaders[..i].iter().any(|(n, _)| n == name) {
                return fail(format!("loader '{name}' registered twice"));
            }
            if self.fields.iter().any(|f| &f.name == name) {
                return fail(format!("loader '{name}' shadows a declared field"));
            }
        }

        let addressable = |name: &str| {
            self.loaders.iter().any(|(n, _)| n == name)
                || self.internal.iter().any(|f| f.name == name)
        };
        for (name, _) in &self.savers {
            if !addressable(name) {
                return fail(format!(
                    "saver '{name}' has no loader or internal field to address"
                ));
            }
        }
        for name in &self.serializable {
            if !addressable(name) {
                return fail(format!(
                    "serializable relation '{name}' has no loader or internal field"
                ));
            }
        }

        Ok(EntityDescriptor {
            type_name: self.type_name,
            table: self.table,
            id_field: self.id_field,
            fields: self.fields,
            internal: self.internal,
            loaders: self.loaders,
            savers: self.savers,
            serializable: self.serializable,
        })
    }
}
