//! Error types for the mapper core.

use thiserror::Error;

/// Result type for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors that can occur in mapper operations.
///
/// Cascade failures have no variant of their own: an error raised while
/// saving a related entity is propagated as-is after the enclosing
/// transaction rolls back, never wrapped.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Store backend error.
    #[error("store error: {0}")]
    Store(#[from] rowmap_store::StoreError),

    /// SQL value conversion error.
    #[error("sql value error: {0}")]
    Sql(#[from] rowmap_sql::SqlError),

    /// A store-dependent operation ran before a store was attached.
    #[error("no store attached to {type_name}; call set_store first")]
    NoStoreAttached {
        /// The entity type that was missing its store.
        type_name: String,
    },

    /// The table or id field is unset where the operation requires them.
    #[error("{type_name} has no {missing}; it cannot be loaded by id")]
    MissingSchema {
        /// The entity type with the incomplete schema.
        type_name: String,
        /// Which part of the schema is missing (`table` or `id field`).
        missing: &'static str,
    },

    /// A field or relation name not declared by the entity type.
    #[error("no property named '{name}' on {type_name}")]
    UnknownProperty {
        /// The entity type that was addressed.
        type_name: String,
        /// The undeclared name.
        name: String,
    },

    /// A bound related type is not present in the type registry.
    #[error("related type not registered: {type_name}")]
    RelatedTypeNotFound {
        /// The type name that failed to resolve.
        type_name: String,
    },

    /// A descriptor violated a build-time invariant.
    #[error("invalid descriptor for {type_name}: {message}")]
    InvalidDescriptor {
        /// The entity type being described.
        type_name: String,
        /// Description of the violation.
        message: String,
    },

    /// Operation not permitted on the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl MapperError {
    /// Creates a no-store-attached error.
    pub fn no_store_attached(type_name: impl Into<String>) -> Self {
        Self::NoStoreAttached {
            type_name: type_name.into(),
        }
    }

    /// Creates a missing schema error.
    pub fn missing_schema(type_name: impl Into<String>, missing: &'static str) -> Self {
        Self::MissingSchema {
            type_name: type_name.into(),
            missing,
        }
    }

    /// Creates an unknown property error.
    pub fn unknown_property(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownProperty {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Creates a related-type-not-found error.
    pub fn related_type_not_found(type_name: impl Into<String>) -> Self {
        Self::RelatedTypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Creates an invalid descriptor error.
    pub fn invalid_descriptor(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
