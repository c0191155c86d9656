//! Schema trait consumed by the trackers and the statement synthesizer.
use core::fmt::Debug;

use alloc::vec::Vec;

use crate::errors::Error;

use super::ColumnDescriptor;

/// A table whose column layout is known at runtime.
///
/// Column order returned by [`describe`](TableDefinition::describe) is the
/// declaration order, which is also the column order of every generated
/// statement. Implementors are expected to uphold the invariants checked by
/// [`RowSchema::new`](super::RowSchema::new): unique names, at least one
/// primary key column, no nullable key column.
pub trait TableDefinition: Debug + Clone {
    /// The table name, unquoted.
    fn table_name(&self) -> &str;

    /// The columns in declaration order.
    fn describe(&self) -> &[ColumnDescriptor];

    /// The primary key columns, in declaration order.
    fn primary_key_columns(&self) -> Vec<&ColumnDescriptor> {
        self.describe()
            .iter()
            .filter(|column| column.is_primary_key())
            .collect()
    }

    /// Looks up a column by name.
    fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.describe().iter().find(|column| column.name() == name)
    }

    /// Returns the declaration index of a column.
    fn column_index(&self, name: &str) -> Option<usize> {
        self.describe().iter().position(|column| column.name() == name)
    }

    /// Looks up a column by name, failing with `UnknownColumn`.
    ///
    /// # Errors
    ///
    /// * `UnknownColumn` - no column carries `name`.
    fn require_column(&self, name: &str) -> Result<&ColumnDescriptor, Error> {
        self.column(name)
            .ok_or_else(|| Error::UnknownColumn(name.into()))
    }
}

impl<T: TableDefinition> TableDefinition for &T {
    #[inline]
    fn table_name(&self) -> &str {
        T::table_name(self)
    }

    #[inline]
    fn describe(&self) -> &[ColumnDescriptor] {
        T::describe(self)
    }
}
