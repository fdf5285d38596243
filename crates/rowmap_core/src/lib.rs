//! # rowmap core
//!
//! A data-mapper base for objects backed by relational rows.
//!
//! This crate provides:
//! - Entity descriptors: the statically declared persistence schema of a
//!   type (fields, internal foreign-key fields, relation loaders/savers)
//! - Change tracking: fingerprint baselines captured at every load/save
//!   boundary, so the write set of an update is exactly what changed
//! - Lazy relations: related entities materialize on first access and are
//!   cached per instance
//! - Cascading transactional saves: autosaved relations first, then the
//!   owner, then registered savers, all in one transaction
//! - Snapshots: controlled serialization of an entity graph that never
//!   captures a live store handle
//!
//! Deletes intentionally do not cascade; removing children is the
//! caller's or the database's responsibility.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod descriptor;
mod entity;
mod error;
mod fingerprint;
mod persist;
mod registry;
mod relation;
mod snapshot;

pub use collection::EntityCollection;
pub use descriptor::{
    DescriptorBuilder, EntityDescriptor, FieldDescriptor, InternalField, LoaderFn, SaverFn,
};
pub use entity::Entity;
pub use error::{MapperError, MapperResult};
pub use fingerprint::{fingerprint_value, Fingerprint};
pub use registry::TypeRegistry;
pub use relation::Related;
pub use snapshot::{EntitySnapshot, RelatedSnapshot};

pub use rowmap_sql::{Row, SqlType, SqlValue};
pub use rowmap_store::{StoreBackend, StoreHandle, Transaction};
