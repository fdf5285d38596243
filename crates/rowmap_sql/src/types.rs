//! Declared column types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a column.
///
/// Field declarations carry a `SqlType` so hydration is type-directed: a
/// text value read from the store into a [`SqlType::Date`] column is parsed
/// into a date value rather than kept as a raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Boolean column.
    Boolean,
    /// Signed 64-bit integer column.
    Integer,
    /// 64-bit floating point column.
    Float,
    /// UTF-8 text column.
    Text,
    /// Calendar date column (no time component).
    Date,
}

impl SqlType {
    /// Returns the lowercase name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
