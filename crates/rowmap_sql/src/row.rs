//! Query result rows.

use crate::value::SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single result row: column name to value.
///
/// Rows do not promise column order; ordering concerns belong to the entity
/// descriptor, which iterates its declared fields in declaration order and
/// looks each one up here by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: HashMap<String, SqlValue>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.insert(name.into(), value.into());
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.get(name)
    }

    /// Returns true if the row has a column of this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over the columns in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, SqlValue); N]> for Row {
    fn from(pairs: [(&str, SqlValue); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut row = Row::new();
        row.set("title", "Hello");
        row.set("count", 3i64);

        assert_eq!(row.get("title"), Some(&SqlValue::from("Hello")));
        assert_eq!(row.get("count"), Some(&SqlValue::Integer(3)));
        assert!(row.get("missing").is_none());
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn from_pairs() {
        let row = Row::from([("a", SqlValue::Integer(1)), ("b", SqlValue::Null)]);
        assert!(row.contains("a"));
        assert!(row.get("b").unwrap().is_null());
    }

    #[test]
    fn set_replaces() {
        let mut row = Row::new();
        row.set("x", 1i64);
        row.set("x", 2i64);
        assert_eq!(row.get("x"), Some(&SqlValue::Integer(2)));
        assert_eq!(row.len(), 1);
    }
}
