//! SQL literal and identifier rendering.

use alloc::string::{String, ToString};
use core::fmt::{self, Display, Write};

use crate::errors::Error;
use crate::schema::{ColumnDescriptor, ColumnType};

use super::Value;

/// Quote a SQL identifier (table or column name) with backticks.
///
/// Escapes any embedded backtick by doubling it.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        if c == '`' {
            out.push_str("``");
        } else {
            out.push(c);
        }
    }
    out.push('`');
    out
}

/// Render `value` as the SQL literal for `column`.
///
/// | Column type | Rendering |
/// |-------------|-----------|
/// | integer, float | unquoted decimal (`1234`, `0.5`) |
/// | boolean | `0` or `1` |
/// | text | single-quoted, embedded quotes doubled |
/// | collection | elements joined by the delimiter, quoted like text; empty is `''` |
/// | any nullable | `NULL` |
///
/// # Errors
///
/// Any error of [`ColumnDescriptor::check`]: the value does not fit the column.
///
/// # Example
///
/// ```rust
/// use sql_row_editor::{format_literal, ColumnDescriptor, ColumnType, Value};
///
/// let name = ColumnDescriptor::new("name", ColumnType::Text).nullable();
/// assert_eq!(format_literal(&Value::from("O'Brien"), &name).unwrap(), "'O''Brien'");
/// assert_eq!(format_literal(&Value::Null, &name).unwrap(), "NULL");
/// ```
pub fn format_literal(value: &Value, column: &ColumnDescriptor) -> Result<String, Error> {
    column.check(value)?;
    let delimiter = match column.column_type() {
        ColumnType::Collection { delimiter, .. } => delimiter,
        _ => ',',
    };
    Ok(Literal::new(value, delimiter).to_string())
}

/// Display adapter writing a value as a SQL literal.
///
/// Performs no validation; callers check the value against its column first.
pub(crate) struct Literal<'a> {
    value: &'a Value,
    delimiter: char,
}

impl<'a> Literal<'a> {
    pub(crate) fn new(value: &'a Value, delimiter: char) -> Self {
        Self { value, delimiter }
    }
}

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Boolean(v) => f.write_str(if *v { "1" } else { "0" }),
            Value::Text(s) => {
                f.write_char('\'')?;
                QuoteEscaper { f: &mut *f }.write_str(s)?;
                f.write_char('\'')
            }
            Value::List(items) => {
                f.write_char('\'')?;
                let mut out = QuoteEscaper { f: &mut *f };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.write_char(self.delimiter)?;
                    }
                    match item {
                        Value::Text(s) => out.write_str(s)?,
                        Value::Integer(v) => write!(out, "{v}")?,
                        Value::Real(v) => write!(out, "{v}")?,
                        other => write!(out, "{}", Literal::new(other, self.delimiter))?,
                    }
                }
                f.write_char('\'')
            }
        }
    }
}

/// Writer doubling every single quote that passes through it.
struct QuoteEscaper<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
}

impl Write for QuoteEscaper<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (i, part) in s.split('\'').enumerate() {
            if i > 0 {
                self.f.write_str("''")?;
            }
            self.f.write_str(part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;
    use alloc::vec;

    fn column(column_type: ColumnType) -> ColumnDescriptor {
        ColumnDescriptor::new("c", column_type).nullable()
    }

    #[test]
    fn test_numeric_literals() {
        let int = column(ColumnType::Integer);
        assert_eq!(format_literal(&Value::Integer(1234), &int).unwrap(), "1234");
        assert_eq!(format_literal(&Value::Integer(-7), &int).unwrap(), "-7");
        assert_eq!(
            format_literal(&Value::Integer(1_000_000), &int).unwrap(),
            "1000000"
        );

        let float = column(ColumnType::Float);
        assert_eq!(format_literal(&Value::Real(3.25), &float).unwrap(), "3.25");
        assert_eq!(format_literal(&Value::Real(2.0), &float).unwrap(), "2");
        assert_eq!(format_literal(&Value::Real(-0.5), &float).unwrap(), "-0.5");
    }

    #[test]
    fn test_boolean_literals() {
        let flag = column(ColumnType::Boolean);
        assert_eq!(format_literal(&Value::Boolean(true), &flag).unwrap(), "1");
        assert_eq!(format_literal(&Value::Boolean(false), &flag).unwrap(), "0");
    }

    #[test]
    fn test_text_escaping() {
        let text = column(ColumnType::Text);
        assert_eq!(
            format_literal(&Value::from("O'Brien"), &text).unwrap(),
            "'O''Brien'"
        );
        assert_eq!(format_literal(&Value::from("''"), &text).unwrap(), "''''''");
        assert_eq!(
            format_literal(&Value::from("a \"b\" \\n `c`"), &text).unwrap(),
            "'a \"b\" \\n `c`'"
        );
        assert_eq!(format_literal(&Value::from(""), &text).unwrap(), "''");
    }

    #[test]
    fn test_null_versus_empty_collection() {
        let text = column(ColumnType::Text);
        assert_eq!(format_literal(&Value::Null, &text).unwrap(), "NULL");

        let auras = column(ColumnType::collection(' ', ScalarType::Integer));
        assert_eq!(format_literal(&Value::List(vec![]), &auras).unwrap(), "''");
        assert_eq!(format_literal(&Value::Null, &auras).unwrap(), "NULL");
    }

    #[test]
    fn test_collection_uses_column_delimiter() {
        let auras = column(ColumnType::collection(' ', ScalarType::Integer));
        assert_eq!(
            format_literal(&Value::from(vec![6i64]), &auras).unwrap(),
            "'6'"
        );
        assert_eq!(
            format_literal(&Value::from(vec![1i64, 22, 333]), &auras).unwrap(),
            "'1 22 333'"
        );

        let names = column(ColumnType::collection(';', ScalarType::Text));
        assert_eq!(
            format_literal(&Value::from(vec!["it's", "fine"]), &names).unwrap(),
            "'it''s;fine'"
        );
    }

    #[test]
    fn test_mismatch_is_reported() {
        let int = ColumnDescriptor::new("entry", ColumnType::Integer);
        assert_eq!(
            format_literal(&Value::Real(1.0), &int),
            Err(Error::TypeMismatch {
                column: "entry".into(),
                expected: ColumnType::Integer,
                found: "float",
            })
        );
        assert_eq!(
            format_literal(&Value::Null, &int),
            Err(Error::NullNotAllowed("entry".into()))
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("entry"), "`entry`");
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }
}
