//! SQL literal quoting.
//!
//! Values cross into SQL text in exactly one place: here. Quoting is
//! type-directed so a backend can render a value as the literal form its
//! declared column type expects, and [`parse_literal`] is the inverse used
//! by stores that accept textual statements.

use crate::error::{SqlError, SqlResult};
use crate::types::SqlType;
use crate::value::SqlValue;

/// Escapes text for inclusion in a single-quoted SQL string.
///
/// Doubles embedded single quotes; no other characters need escaping in
/// standard SQL string literals.
#[must_use]
pub fn escape_text(text: &str) -> String {
    text.replace('\'', "''")
}

/// Renders a value as a SQL literal of the declared type.
///
/// The value is first coerced to `ty`, so quoting a text value into a date
/// column validates the date on the way out.
///
/// # Errors
///
/// Returns an error if the value cannot be coerced to `ty`.
pub fn quote(value: &SqlValue, ty: SqlType) -> SqlResult<String> {
    let coerced = value.coerce(ty)?;
    Ok(match coerced {
        SqlValue::Null => "null".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Text(s) => format!("'{}'", escape_text(&s)),
        SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
    })
}

/// Parses a SQL literal back into a value.
///
/// Accepts the forms [`quote`] produces: `null`, booleans, integers,
/// floats, and single-quoted strings. Quoted strings come back as text;
/// whether they are dates is the caller's (type-directed) decision.
///
/// # Errors
///
/// Returns [`SqlError::MalformedLiteral`] for anything else.
pub fn parse_literal(input: &str) -> SqlResult<SqlValue> {
    let trimmed = input.trim();

    if trimmed.eq_ignore_ascii_case("null") {
        return Ok(SqlValue::Null);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(SqlValue::Bool(true));
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(SqlValue::Bool(false));
    }

    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        // Reject strings with unescaped embedded quotes.
        let mut text = String::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                match chars.peek() {
                    Some('\'') => {
                        chars.next();
                        text.push('\'');
                    }
                    _ => return Err(SqlError::malformed_literal(input)),
                }
            } else {
                text.push(c);
            }
        }
        return Ok(SqlValue::Text(text));
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(SqlValue::Integer(i));
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Ok(SqlValue::Float(f));
    }

    Err(SqlError::malformed_literal(input))
}
