//! Change tracking for a group of rows sharing one key.
//!
//! Some tables store several rows per entity, for example one loot row per
//! item dropped by a creature. Those rows are identified by a *group column*
//! (the entity, `Entry`) and a *row key column* (the item, `Item`). A
//! [`RowSetTracker`] edits all rows of one group at once and produces:
//!
//! - a full replace, deleting the whole group and re-inserting every row;
//! - a diff statement, deleting only the added, edited or removed rows and
//!   re-inserting the ones that still exist.
//!
//! ```text
//! DELETE FROM `creature_loot_template` WHERE (`Entry` = 1234) AND (`Item` IN (5, 6));
//! INSERT INTO `creature_loot_template` (`Entry`, `Item`, `Chance`) VALUES
//! (1234, 5, 50),
//! (1234, 6, 10);
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::errors::Error;
use crate::schema::{ColumnDescriptor, TableDefinition};
use crate::snapshot::{IndexMap, RowSnapshot};
use crate::statements;
use crate::value::{Value, format_literal, quote_identifier};

/// Rows of one group keyed by their row key, in display order.
type RowMap = IndexMap<Value, RowSnapshot>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RowSetSession {
    group: Value,
    original: RowMap,
    current: RowMap,
}

/// An editing session over every row of one group of `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSetTracker<T: TableDefinition> {
    schema: T,
    group_column: String,
    row_key_column: String,
    session: Option<RowSetSession>,
}

impl<T: TableDefinition> RowSetTracker<T> {
    /// Create an empty session.
    ///
    /// # Arguments
    ///
    /// * `schema` - The table schema.
    /// * `group_column` - The column shared by all rows of a group.
    /// * `row_key_column` - The column telling rows of a group apart.
    ///
    /// # Errors
    ///
    /// * `UnknownColumn` - One of the key columns is not part of the schema.
    /// * `NullableKeyColumn` - One of the key columns accepts `NULL`, which no
    ///   `=` or `IN` predicate can match.
    pub fn new(
        schema: T,
        group_column: impl Into<String>,
        row_key_column: impl Into<String>,
    ) -> Result<Self, Error> {
        let group_column = group_column.into();
        let row_key_column = row_key_column.into();
        for name in [&group_column, &row_key_column] {
            if schema.require_column(name)?.is_nullable() {
                return Err(Error::NullableKeyColumn(name.clone()));
            }
        }
        Ok(Self {
            schema,
            group_column,
            row_key_column,
            session: None,
        })
    }

    /// The schema of the edited table.
    #[must_use]
    pub fn schema(&self) -> &T {
        &self.schema
    }

    fn group_descriptor(&self) -> Result<&ColumnDescriptor, Error> {
        self.schema.require_column(&self.group_column)
    }

    fn row_key_descriptor(&self) -> Result<&ColumnDescriptor, Error> {
        self.schema.require_column(&self.row_key_column)
    }

    fn session(&self) -> Result<&RowSetSession, Error> {
        self.session.as_ref().ok_or(Error::NotLoaded)
    }

    fn session_mut(&mut self) -> Result<&mut RowSetSession, Error> {
        self.session.as_mut().ok_or(Error::NotLoaded)
    }

    /// Validate a row and check it belongs to `group`, returning its key.
    fn admit(&self, group: &Value, row: &RowSnapshot) -> Result<Value, Error> {
        row.validate(&self.schema)?;
        let row_group = row.require(&self.group_column)?;
        if row_group != group {
            return Err(Error::GroupMismatch {
                expected: format_literal(group, self.group_descriptor()?)?,
                found: format_literal(row_group, self.group_descriptor()?)?,
            });
        }
        Ok(row.require(&self.row_key_column)?.clone())
    }

    /// Render a row key for error messages.
    fn render_key(key: &Value) -> String {
        key.to_string()
    }

    /// Load the rows of `group` as the baseline.
    ///
    /// # Errors
    ///
    /// * Any error of [`RowSnapshot::validate`] for a row or of
    ///   [`ColumnDescriptor::check`] for `group`.
    /// * `GroupMismatch` - A row carries another group value.
    /// * `DuplicateRowKey` - Two rows share a row key.
    pub fn load(
        &mut self,
        group: impl Into<Value>,
        rows: impl IntoIterator<Item = RowSnapshot>,
    ) -> Result<(), Error> {
        let group = group.into();
        self.group_descriptor()?.check(&group)?;

        let mut original = RowMap::default();
        for row in rows {
            let key = self.admit(&group, &row)?;
            if original.contains_key(&key) {
                return Err(Error::DuplicateRowKey(Self::render_key(&key)));
            }
            original.insert(key, row);
        }

        tracing::debug!(
            table = self.schema.table_name(),
            rows = original.len(),
            "loaded row group baseline"
        );
        self.session = Some(RowSetSession {
            group,
            current: original.clone(),
            original,
        });
        Ok(())
    }

    /// The group value of the session.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn group(&self) -> Result<&Value, Error> {
        Ok(&self.session()?.group)
    }

    /// The current rows, in display order.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn rows(&self) -> Result<Vec<&RowSnapshot>, Error> {
        Ok(self.session()?.current.values().collect())
    }

    /// Append a new row to the group.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    /// * Any error of [`RowSnapshot::validate`].
    /// * `GroupMismatch` - The row carries another group value.
    /// * `DuplicateRowKey` - A current row already uses the row key.
    pub fn add_row(&mut self, row: RowSnapshot) -> Result<(), Error> {
        let key = self.admit(&self.session()?.group, &row)?;
        if self.session()?.current.contains_key(&key) {
            return Err(Error::DuplicateRowKey(Self::render_key(&key)));
        }
        tracing::trace!(table = self.schema.table_name(), "added row");
        self.session_mut()?.current.insert(key, row);
        Ok(())
    }

    /// Remove the row with `key`, returning it.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    /// * `UnknownRowKey` - No current row uses `key`.
    pub fn remove_row(&mut self, key: impl Into<Value>) -> Result<RowSnapshot, Error> {
        let key = key.into();
        let rendered = Self::render_key(&key);
        let removed = self
            .session_mut()?
            .current
            .shift_remove(&key)
            .ok_or(Error::UnknownRowKey(rendered))?;
        tracing::trace!(table = self.schema.table_name(), "removed row");
        Ok(removed)
    }

    /// Overwrite `column` of the row with `key`.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    /// * `KeyColumnEdit` - `column` is the group or row key column.
    /// * `UnknownColumn` - `column` is not part of the schema.
    /// * `UnknownRowKey` - No current row uses `key`.
    /// * Any error of [`ColumnDescriptor::check`].
    pub fn set_value(
        &mut self,
        key: impl Into<Value>,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let key = key.into();
        let value = value.into();
        self.session()?;
        if column == self.group_column || column == self.row_key_column {
            return Err(Error::KeyColumnEdit(column.into()));
        }
        let descriptor = self.schema.require_column(column)?;
        descriptor.check(&value)?;
        let name = String::from(descriptor.name());
        let rendered = Self::render_key(&key);
        let row = self
            .session_mut()?
            .current
            .get_mut(&key)
            .ok_or(Error::UnknownRowKey(rendered))?;
        row.set(name, value);
        Ok(())
    }

    /// Keys of the rows that were added, edited or removed: baseline rows
    /// first in baseline order, then added rows in current order.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn dirty_row_keys(&self) -> Result<Vec<&Value>, Error> {
        let session = self.session()?;
        let changed = session
            .original
            .iter()
            .filter(|(key, row)| session.current.get(*key) != Some(*row))
            .map(|(key, _)| key);
        let added = session
            .current
            .keys()
            .filter(|key| !session.original.contains_key(*key));
        Ok(changed.chain(added).collect())
    }

    /// Whether any row was added, edited or removed. `false` before a group
    /// is loaded.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty_row_keys().is_ok_and(|keys| !keys.is_empty())
    }

    /// Discard every edit.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn revert(&mut self) -> Result<(), Error> {
        let session = self.session_mut()?;
        session.current = session.original.clone();
        tracing::debug!(table = self.schema.table_name(), "reverted row group edits");
        Ok(())
    }

    /// Accept the current rows as the new baseline.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn commit(&mut self) -> Result<(), Error> {
        let session = self.session_mut()?;
        session.original = session.current.clone();
        tracing::debug!(table = self.schema.table_name(), "committed row group baseline");
        Ok(())
    }

    /// Render `DELETE FROM t WHERE (group = g)`, without terminator.
    fn delete_group(&self, group: &Value) -> Result<String, Error> {
        let mut sql = String::from("DELETE FROM ");
        sql.push_str(&quote_identifier(self.schema.table_name()));
        sql.push_str(" WHERE (");
        sql.push_str(&quote_identifier(&self.group_column));
        sql.push_str(" = ");
        sql.push_str(&format_literal(group, self.group_descriptor()?)?);
        sql.push(')');
        Ok(sql)
    }

    /// The statement deleting the whole group and inserting every current row.
    ///
    /// With no current rows only the `DELETE` is emitted.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn full_replace(&self) -> Result<String, Error> {
        let session = self.session()?;
        let mut sql = self.delete_group(&session.group)?;
        sql.push(';');
        if !session.current.is_empty() {
            sql.push('\n');
            sql.push_str(&statements::insert(&self.schema, session.current.values())?);
        }
        Ok(sql)
    }

    /// The statement touching only the dirty rows, or an empty string when
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No group has been loaded.
    pub fn diff_statement(&self) -> Result<String, Error> {
        let session = self.session()?;
        let dirty = self.dirty_row_keys()?;
        if dirty.is_empty() {
            return Ok(String::new());
        }

        let key_column = self.row_key_descriptor()?;
        let mut sql = self.delete_group(&session.group)?;
        sql.push_str(" AND (");
        sql.push_str(&quote_identifier(key_column.name()));
        sql.push_str(" IN (");
        for (i, key) in dirty.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&format_literal(key, key_column)?);
        }
        sql.push_str("));");

        let inserted: Vec<&RowSnapshot> = session
            .current
            .iter()
            .filter(|(key, _)| dirty.contains(key))
            .map(|(_, row)| row)
            .collect();
        if !inserted.is_empty() {
            sql.push('\n');
            sql.push_str(&statements::insert(&self.schema, inserted)?);
        }
        tracing::trace!(
            table = self.schema.table_name(),
            dirty = dirty.len(),
            "synthesized row group diff"
        );
        Ok(sql)
    }
}
