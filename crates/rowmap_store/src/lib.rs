//! # rowmap store
//!
//! Relational store trait and implementations for rowmap.
//!
//! A [`StoreBackend`] executes the actual row-level operations on behalf of
//! the mapper: single-row selects, inserts with generated keys, keyed
//! updates and deletes, and transaction control. Backends know nothing
//! about entities; they deal in tables, column names and
//! [`rowmap_sql::SqlValue`]s.
//!
//! ## Design Principles
//!
//! - Backends are row stores, not query engines; the mapper issues
//!   structured calls, and raw statements exist only as an escape hatch
//!   for custom relation loaders
//! - Must be `Send + Sync`; callers share one backend through a
//!   [`StoreHandle`]
//! - Transactions nest: each `begin` must be paired with a `commit` or
//!   `rollback`, and [`Transaction`] enforces the pairing by scope
//!
//! ## Available Backends
//!
//! - [`InMemoryStore`] - for tests and ephemeral data; counts every
//!   operation so tests can assert exactly which statements were issued
//!
//! ## Example
//!
//! ```
//! use rowmap_store::{InMemoryStore, StoreBackend};
//! use rowmap_sql::SqlValue;
//!
//! let store = InMemoryStore::new();
//! let id = store
//!     .insert("article", &[("title".into(), SqlValue::from("Hello"))], Some("id"))
//!     .unwrap();
//! assert_eq!(id, Some(1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod transaction;

pub use backend::{StoreBackend, StoreHandle};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, StoreStats};
pub use transaction::Transaction;
