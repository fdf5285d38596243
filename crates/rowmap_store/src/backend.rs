//! Store backend trait definition.

use crate::error::StoreResult;
use rowmap_sql::{quote, Row, SqlType, SqlValue};
use std::sync::Arc;

/// Shared handle to a store backend.
///
/// Entities hold one of these; cloning is cheap and every clone addresses
/// the same underlying store.
pub type StoreHandle = Arc<dyn StoreBackend>;

/// A relational store backend.
///
/// Backends execute row-level operations. The mapper calls the structured
/// methods (`select_row`, `insert`, `update`, `delete`); `execute` exists
/// for relation loaders whose queries are not simple key lookups.
///
/// # Invariants
///
/// - `insert` returns the effective integer key when `id_field` is given
///   and the key column is integer-valued
/// - `begin`/`commit`/`rollback` nest; a rollback undoes everything since
///   the matching `begin`
/// - Backends must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - for testing
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Executes a raw statement and returns the result rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement is malformed or not supported by
    /// this backend.
    fn execute(&self, statement: &str) -> StoreResult<Vec<Row>>;

    /// Renders a value as a SQL literal of the declared type.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be coerced to `ty`.
    fn quote(&self, value: &SqlValue, ty: SqlType) -> StoreResult<String> {
        Ok(quote(value, ty)?)
    }

    /// Returns the single row of `table` whose `key_field` equals `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    fn select_row(&self, table: &str, key_field: &str, key: &SqlValue)
        -> StoreResult<Option<Row>>;

    /// Returns every row of `table` whose `key_field` equals `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    fn select_rows(&self, table: &str, key_field: &str, key: &SqlValue) -> StoreResult<Vec<Row>>;

    /// Inserts a row and returns the effective key.
    ///
    /// When `id_field` is given and the supplied key value is null or
    /// absent, the backend assigns the next key and returns it; a non-null
    /// integer key is honored as-is. `None` is returned when no key column
    /// is involved.
    ///
    /// # Errors
    ///
    /// Returns an error on key conflicts or I/O failure.
    fn insert(
        &self,
        table: &str,
        fields: &[(String, SqlValue)],
        id_field: Option<&str>,
    ) -> StoreResult<Option<i64>>;

    /// Updates the rows of `table` whose `key_field` equals `key`.
    ///
    /// Returns the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    fn update(
        &self,
        table: &str,
        fields: &[(String, SqlValue)],
        key_field: &str,
        key: &SqlValue,
    ) -> StoreResult<usize>;

    /// Deletes the rows of `table` whose `key_field` equals `key`.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    fn delete(&self, table: &str, key_field: &str, key: &SqlValue) -> StoreResult<usize>;

    /// Opens a transaction. Transactions nest.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot open a transaction.
    fn begin(&self) -> StoreResult<()>;

    /// Commits the innermost open transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open.
    fn commit(&self) -> StoreResult<()>;

    /// Rolls back the innermost open transaction, undoing every write
    /// since the matching `begin`.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is open.
    fn rollback(&self) -> StoreResult<()>;
}
