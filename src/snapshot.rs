//! Row snapshots: one typed value per column.

use alloc::string::String;

use indexmap::IndexMap as IndexMapRaw;

use crate::errors::Error;
use crate::schema::TableDefinition;
use crate::value::Value;

/// `IndexMap` alias using hashbrown's default hasher for `no_std` compatibility.
pub(crate) type IndexMap<K, V> = IndexMapRaw<K, V, hashbrown::DefaultHashBuilder>;

/// A concrete assignment of values to the columns of a row.
///
/// Snapshots compare field by field with value equality; the order in which
/// columns were assigned does not matter. A snapshot is only checked against
/// a schema when it enters a tracker.
///
/// ```rust
/// use sql_row_editor::{RowSnapshot, Value};
///
/// let row = RowSnapshot::new().with("entry", 1234).with("path_id", 0);
/// assert_eq!(row.get("entry"), Some(&Value::Integer(1234)));
/// assert_eq!(row.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RowSnapshot {
    values: IndexMap<String, Value>,
}

impl RowSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default row of a table: every column takes its
    /// [default value](crate::ColumnDescriptor::default_value).
    ///
    /// The caller typically assigns the primary key afterwards with
    /// [`with`](Self::with).
    #[must_use]
    pub fn defaults<T: TableDefinition>(schema: &T) -> Self {
        schema
            .describe()
            .iter()
            .map(|column| (String::from(column.name()), column.default_value()))
            .collect()
    }

    /// Sets a column and returns the snapshot, for chained construction.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a column, returning the previous value if any.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(column.into(), value.into())
    }

    /// Returns the value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Returns the value of a column, failing with `MissingColumn`.
    pub(crate) fn require(&self, column: &str) -> Result<&Value, Error> {
        self.get(column)
            .ok_or_else(|| Error::MissingColumn(column.into()))
    }

    /// Number of assigned columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no column is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(column, value)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Checks the snapshot against a schema.
    ///
    /// # Errors
    ///
    /// * `UnknownColumn` - The snapshot assigns a column the schema lacks.
    /// * `MissingColumn` - A schema column has no value.
    /// * Any error of [`ColumnDescriptor::check`](crate::ColumnDescriptor::check).
    pub fn validate<T: TableDefinition>(&self, schema: &T) -> Result<(), Error> {
        if let Some(unknown) = self.values.keys().find(|name| schema.column(name).is_none()) {
            return Err(Error::UnknownColumn(unknown.clone()));
        }
        for column in schema.describe() {
            column.check(self.require(column.name())?)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RowSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
