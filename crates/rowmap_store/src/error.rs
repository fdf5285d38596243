//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value could not be quoted or converted.
    #[error("sql value error: {0}")]
    Sql(#[from] rowmap_sql::SqlError),

    /// The named table does not exist.
    #[error("unknown table: {table}")]
    UnknownTable {
        /// The table that was addressed.
        table: String,
    },

    /// An insert supplied a key that is already present.
    #[error("key conflict in table {table}: {key}")]
    KeyConflict {
        /// The table the insert addressed.
        table: String,
        /// Display form of the conflicting key.
        key: String,
    },

    /// Commit or rollback was called with no transaction open.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// A raw statement was not in a form the backend supports.
    #[error("unsupported statement: {statement}")]
    UnsupportedStatement {
        /// The offending statement text.
        statement: String,
    },
}

impl StoreError {
    /// Creates an unknown table error.
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Creates a key conflict error.
    pub fn key_conflict(table: impl Into<String>, key: impl std::fmt::Display) -> Self {
        Self::KeyConflict {
            table: table.into(),
            key: key.to_string(),
        }
    }

    /// Creates an unsupported statement error.
    pub fn unsupported_statement(statement: impl Into<String>) -> Self {
        Self::UnsupportedStatement {
            statement: statement.into(),
        }
    }
}
