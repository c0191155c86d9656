//! Runtime table schema.
//!
//! This module provides [`RowSchema`], the validated, immutable description
//! of a table that the editing sessions are built on.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::errors::Error;

use super::{ColumnDescriptor, TableDefinition};

/// A validated table schema.
///
/// # Example
///
/// ```rust
/// use sql_row_editor::{ColumnDescriptor, ColumnType, RowSchema, TableDefinition};
///
/// let schema = RowSchema::new(
///     "creature_template_movement",
///     vec![
///         ColumnDescriptor::new("CreatureId", ColumnType::Integer).primary_key(),
///         ColumnDescriptor::new("Ground", ColumnType::Integer),
///         ColumnDescriptor::new("Swim", ColumnType::Integer),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(schema.table_name(), "creature_template_movement");
/// assert_eq!(schema.primary_key_columns().len(), 1);
/// assert_eq!(schema.column_index("Swim"), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawRowSchema", into = "RawRowSchema")
)]
pub struct RowSchema {
    name: String,
    columns: Vec<ColumnDescriptor>,
}

impl RowSchema {
    /// Create a schema, validating its invariants.
    ///
    /// # Arguments
    ///
    /// * `name` - The table name.
    /// * `columns` - The columns in declaration order.
    ///
    /// # Errors
    ///
    /// * `DuplicateColumn` - Two columns share a name.
    /// * `MissingPrimaryKey` - No column is marked as primary key.
    /// * `NullablePrimaryKey` - A primary key column is nullable.
    /// * `NumericDelimiter` - A numeric collection uses a delimiter its
    ///   elements can contain.
    /// * Any error of [`ColumnDescriptor::check`] raised by an explicit default.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Result<Self, Error> {
        let name = name.into();

        {
            let mut seen = HashSet::with_capacity(columns.len());
            for column in &columns {
                if !seen.insert(column.name()) {
                    return Err(Error::DuplicateColumn(column.name().into()));
                }
                if column.is_primary_key() && column.is_nullable() {
                    return Err(Error::NullablePrimaryKey(column.name().into()));
                }
                column.check_definition()?;
                column.check(&column.default_value())?;
            }
        }

        if !columns.iter().any(ColumnDescriptor::is_primary_key) {
            return Err(Error::MissingPrimaryKey(name));
        }

        Ok(Self { name, columns })
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnDescriptor::name)
    }
}

impl TableDefinition for RowSchema {
    #[inline]
    fn table_name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn describe(&self) -> &[ColumnDescriptor] {
        &self.columns
    }
}

/// Unvalidated form used when a schema is read from configuration.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawRowSchema {
    name: String,
    columns: Vec<ColumnDescriptor>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawRowSchema> for RowSchema {
    type Error = Error;

    fn try_from(raw: RawRowSchema) -> Result<Self, Self::Error> {
        RowSchema::new(raw.name, raw.columns)
    }
}

#[cfg(feature = "serde")]
impl From<RowSchema> for RawRowSchema {
    fn from(schema: RowSchema) -> Self {
        Self {
            name: schema.name,
            columns: schema.columns,
        }
    }
}
