//! Dynamic column values.

use crate::error::{SqlError, SqlResult};
use crate::types::SqlType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamic column value.
///
/// `SqlValue` is the currency between entities and the relational store:
/// entity fields hold it, rows carry it, and backends quote it into SQL
/// literals. Equality is structural; two values built independently from
/// the same content compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl SqlValue {
    /// Returns the lowercase name of this value's runtime type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
        }
    }

    /// Returns true if this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean content, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float content, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text content, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the date content, if this is a date.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Converts this value into the declared column type.
    ///
    /// This is the hydration path: values read back from a store arrive in
    /// whatever representation the backend produced, and the declared
    /// [`SqlType`] decides what they become. NULL passes through unchanged
    /// for every target type.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] when no sensible conversion
    /// exists, or [`SqlError::DateParse`] for unparseable date text.
    pub fn coerce(&self, target: SqlType) -> SqlResult<SqlValue> {
        if self.is_null() {
            return Ok(Self::Null);
        }

        match target {
            SqlType::Boolean => match self {
                Self::Bool(b) => Ok(Self::Bool(*b)),
                Self::Integer(i) => Ok(Self::Bool(*i != 0)),
                Self::Text(s) => match s.as_str() {
                    "true" | "t" | "1" => Ok(Self::Bool(true)),
                    "false" | "f" | "0" => Ok(Self::Bool(false)),
                    _ => Err(SqlError::type_mismatch(target, self)),
                },
                _ => Err(SqlError::type_mismatch(target, self)),
            },
            SqlType::Integer => match self {
                Self::Integer(i) => Ok(Self::Integer(*i)),
                Self::Bool(b) => Ok(Self::Integer(i64::from(*b))),
                Self::Float(f) if f.fract() == 0.0 => Ok(Self::Integer(*f as i64)),
                Self::Text(s) => s
                    .parse::<i64>()
                    .map(Self::Integer)
                    .map_err(|_| SqlError::type_mismatch(target, self)),
                _ => Err(SqlError::type_mismatch(target, self)),
            },
            SqlType::Float => match self {
                Self::Float(f) => Ok(Self::Float(*f)),
                Self::Integer(i) => Ok(Self::Float(*i as f64)),
                Self::Text(s) => s
                    .parse::<f64>()
                    .map(Self::Float)
                    .map_err(|_| SqlError::type_mismatch(target, self)),
                _ => Err(SqlError::type_mismatch(target, self)),
            },
            SqlType::Text => match self {
                Self::Text(s) => Ok(Self::Text(s.clone())),
                Self::Integer(i) => Ok(Self::Text(i.to_string())),
                Self::Float(f) => Ok(Self::Text(f.to_string())),
                Self::Bool(b) => Ok(Self::Text(b.to_string())),
                Self::Date(d) => Ok(Self::Text(d.format("%Y-%m-%d").to_string())),
                Self::Null => Ok(Self::Null),
            },
            SqlType::Date => match self {
                Self::Date(d) => Ok(Self::Date(*d)),
                Self::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(Self::Date)
                    .map_err(|_| SqlError::date_parse(s.clone())),
                _ => Err(SqlError::type_mismatch(target, self)),
            },
        }
    }

    /// Compares two values for key matching.
    ///
    /// Like `==` but integers and floats compare across the numeric types,
    /// matching how SQL equality treats `7 = 7.0`.
    #[must_use]
    pub fn matches(&self, other: &SqlValue) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for SqlValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn structural_equality() {
        assert_eq!(SqlValue::Text("a".into()), SqlValue::from("a"));
        assert_eq!(SqlValue::from(7i64), SqlValue::Integer(7));
        assert_ne!(SqlValue::Integer(7), SqlValue::Float(7.0));
    }

    #[test]
    fn matches_crosses_numeric_types() {
        assert!(SqlValue::Integer(7).matches(&SqlValue::Float(7.0)));
        assert!(!SqlValue::Integer(7).matches(&SqlValue::Float(7.5)));
        assert!(SqlValue::Text("x".into()).matches(&SqlValue::from("x")));
    }

    #[test]
    fn coerce_text_to_date() {
        let parsed = SqlValue::from("2024-03-09").coerce(SqlType::Date).unwrap();
        assert_eq!(parsed, SqlValue::Date(date(2024, 3, 9)));
    }

    #[test]
    fn coerce_bad_date_fails() {
        let err = SqlValue::from("not a date").coerce(SqlType::Date).unwrap_err();
        assert!(matches!(err, SqlError::DateParse { .. }));
    }

    #[test]
    fn coerce_integer_to_boolean() {
        assert_eq!(
            SqlValue::Integer(1).coerce(SqlType::Boolean).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            SqlValue::Integer(0).coerce(SqlType::Boolean).unwrap(),
            SqlValue::Bool(false)
        );
    }

    #[test]
    fn null_passes_through_every_type() {
        for ty in [
            SqlType::Boolean,
            SqlType::Integer,
            SqlType::Float,
            SqlType::Text,
            SqlType::Date,
        ] {
            assert_eq!(SqlValue::Null.coerce(ty).unwrap(), SqlValue::Null);
        }
    }

    #[test]
    fn coerce_date_to_text_is_iso() {
        let text = SqlValue::Date(date(2024, 1, 2)).coerce(SqlType::Text).unwrap();
        assert_eq!(text, SqlValue::from("2024-01-02"));
    }

    #[test]
    fn option_conversion() {
        let none: Option<i64> = None;
        assert_eq!(SqlValue::from(none), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::Integer(3));
    }

    #[test]
    fn serde_round_trip() {
        let value = SqlValue::Date(date(2023, 12, 31));
        let json = serde_json::to_string(&value).unwrap();
        let back: SqlValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
