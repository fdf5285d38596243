//! # rowmap SQL value model
//!
//! Column values, row mappings and SQL literal quoting for rowmap.
//!
//! This crate is the lowest layer of the workspace. It knows nothing about
//! entities or stores; it defines the data that crosses the boundary between
//! the two:
//!
//! - [`SqlValue`] - a dynamic column value (null, bool, integer, float,
//!   text, date)
//! - [`SqlType`] - the declared type of a column, used for type-directed
//!   hydration and literal quoting
//! - [`Row`] - a column-name to value mapping, the unit of query results
//! - [`quote`] / [`parse_literal`] - conversion between values and SQL
//!   literal text
//!
//! ## Example
//!
//! ```
//! use rowmap_sql::{quote, SqlType, SqlValue};
//!
//! let title = SqlValue::Text("it's here".into());
//! assert_eq!(quote(&title, SqlType::Text).unwrap(), "'it''s here'");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod literal;
mod row;
mod types;
mod value;

pub use chrono::NaiveDate;
pub use error::{SqlError, SqlResult};
pub use literal::{escape_text, parse_literal, quote};
pub use row::Row;
pub use types::SqlType;
pub use value::SqlValue;
