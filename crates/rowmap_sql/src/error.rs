//! Error types for the SQL value layer.

use crate::types::SqlType;
use thiserror::Error;

/// Result type for SQL value operations.
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors that can occur when converting or quoting SQL values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// A value could not be converted to the declared column type.
    #[error("type mismatch: cannot read {value} as {expected}")]
    TypeMismatch {
        /// The declared column type.
        expected: SqlType,
        /// Display form of the offending value.
        value: String,
    },

    /// A text value could not be parsed as a date.
    #[error("invalid date literal: {input}")]
    DateParse {
        /// The text that failed to parse.
        input: String,
    },

    /// A SQL literal could not be parsed back into a value.
    #[error("malformed literal: {input}")]
    MalformedLiteral {
        /// The literal text that failed to parse.
        input: String,
    },
}

impl SqlError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: SqlType, value: impl std::fmt::Display) -> Self {
        Self::TypeMismatch {
            expected,
            value: value.to_string(),
        }
    }

    /// Creates a date parse error.
    pub fn date_parse(input: impl Into<String>) -> Self {
        Self::DateParse {
            input: input.into(),
        }
    }

    /// Creates a malformed literal error.
    pub fn malformed_literal(input: impl Into<String>) -> Self {
        Self::MalformedLiteral {
            input: input.into(),
        }
    }
}
