//! Column descriptors and the semantic types a column can hold.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Display};

use crate::errors::Error;
use crate::value::Value;

/// Element type of a collection column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ScalarType {
    /// 64-bit signed integer elements.
    Integer,
    /// Finite floating point elements.
    Float,
    /// Text elements, which must not contain the delimiter.
    Text,
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Integer => f.write_str("integer"),
            ScalarType::Float => f.write_str("float"),
            ScalarType::Text => f.write_str("text"),
        }
    }
}

/// Semantic type of a column, which drives both validation and literal rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ColumnType {
    /// Integer column, rendered as an unquoted decimal.
    Integer,
    /// Floating point column, rendered as an unquoted decimal.
    Float,
    /// Text column, rendered single-quoted with quotes doubled.
    Text,
    /// Boolean stored as an integer, rendered as `0` or `1`.
    Boolean,
    /// A list stored as one delimited text column.
    Collection {
        /// Character placed between elements.
        delimiter: char,
        /// Type of every element.
        element: ScalarType,
    },
}

impl ColumnType {
    /// Shorthand for a [`ColumnType::Collection`].
    #[must_use]
    pub const fn collection(delimiter: char, element: ScalarType) -> Self {
        ColumnType::Collection { delimiter, element }
    }

    /// The value a column of this type takes in a freshly created row.
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self {
            ColumnType::Integer => Value::Integer(0),
            ColumnType::Float => Value::Real(0.0),
            ColumnType::Text => Value::Text(String::new()),
            ColumnType::Boolean => Value::Boolean(false),
            ColumnType::Collection { .. } => Value::List(Vec::new()),
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("integer"),
            ColumnType::Float => f.write_str("float"),
            ColumnType::Text => f.write_str("text"),
            ColumnType::Boolean => f.write_str("boolean"),
            ColumnType::Collection { element, .. } => write!(f, "collection of {element}"),
        }
    }
}

/// Description of a single column of a table.
///
/// Built with [`ColumnDescriptor::new`] and the chained modifiers:
///
/// ```rust
/// use sql_row_editor::{ColumnDescriptor, ColumnType, ScalarType};
///
/// let entry = ColumnDescriptor::new("entry", ColumnType::Integer).primary_key();
/// let auras = ColumnDescriptor::new("auras", ColumnType::collection(' ', ScalarType::Integer))
///     .nullable();
///
/// assert!(entry.is_primary_key());
/// assert!(auras.is_nullable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnDescriptor {
    name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    column_type: ColumnType,
    #[cfg_attr(feature = "serde", serde(default))]
    primary_key: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    nullable: bool,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    default: Option<Value>,
}

impl ColumnDescriptor {
    /// Create a non-nullable, non-key column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            nullable: false,
            default: None,
        }
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows `NULL` in the column.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Overrides the value used for this column in a default row.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The semantic type of the column.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Whether the column belongs to the primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the column accepts `NULL`.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The value of this column in a default row: the configured default,
    /// otherwise the zero value of the column type.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.column_type.zero_value())
    }

    /// Checks that the column type itself is usable.
    ///
    /// Numeric elements are rendered in decimal, so a collection of numbers
    /// cannot be delimited by a digit, a sign or a decimal point.
    ///
    /// # Errors
    ///
    /// * `NumericDelimiter` - the delimiter can appear inside a rendered element.
    pub fn check_definition(&self) -> Result<(), Error> {
        match self.column_type {
            ColumnType::Collection {
                delimiter,
                element: ScalarType::Integer | ScalarType::Float,
            } if delimiter.is_ascii_digit() || matches!(delimiter, '-' | '+' | '.') => {
                Err(Error::NumericDelimiter {
                    column: self.name.clone(),
                    delimiter,
                })
            }
            _ => Ok(()),
        }
    }

    /// Checks that `value` conforms to this column.
    ///
    /// # Errors
    ///
    /// * `NullNotAllowed` - `value` is `NULL` and the column is not nullable.
    /// * `TypeMismatch` - the runtime shape of `value` differs from the column type.
    /// * `NonFiniteFloat` - a float (or float element) is NaN or infinite.
    /// * `DelimiterInElement` - a text element contains the collection delimiter.
    /// * `NumericDelimiter` - see [`check_definition`](Self::check_definition).
    pub fn check(&self, value: &Value) -> Result<(), Error> {
        if value.is_null() {
            return if self.nullable {
                Ok(())
            } else {
                Err(Error::NullNotAllowed(self.name.clone()))
            };
        }
        match (self.column_type, value) {
            (ColumnType::Integer, Value::Integer(_))
            | (ColumnType::Text, Value::Text(_))
            | (ColumnType::Boolean, Value::Boolean(_)) => Ok(()),
            (ColumnType::Float, Value::Real(v)) => self.check_finite(*v),
            (ColumnType::Collection { delimiter, element }, Value::List(items)) => {
                self.check_definition()?;
                items
                    .iter()
                    .try_for_each(|item| self.check_element(delimiter, element, item))
            }
            (_, found) => Err(self.mismatch(found)),
        }
    }

    fn check_element(&self, delimiter: char, element: ScalarType, item: &Value) -> Result<(), Error> {
        match (element, item) {
            (ScalarType::Integer, Value::Integer(_)) => Ok(()),
            (ScalarType::Float, Value::Real(v)) => self.check_finite(*v),
            (ScalarType::Text, Value::Text(s)) if s.contains(delimiter) => {
                Err(Error::DelimiterInElement {
                    column: self.name.clone(),
                    delimiter,
                })
            }
            (ScalarType::Text, Value::Text(_)) => Ok(()),
            (_, found) => Err(self.mismatch(found)),
        }
    }

    fn check_finite(&self, v: f64) -> Result<(), Error> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(Error::NonFiniteFloat(self.name.clone()))
        }
    }

    fn mismatch(&self, found: &Value) -> Error {
        Error::TypeMismatch {
            column: self.name.clone(),
            expected: self.column_type,
            found: found.kind_name(),
        }
    }
}
