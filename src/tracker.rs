//! Change tracking for a single row.
//!
//! A [`DiffTracker`] is one editing session: it holds the original snapshot
//! of the row being edited and the current snapshot the UI mutates, and
//! derives from them the dirty columns and the SQL that persists the edit.
//!
//! # Example
//!
//! ```rust
//! use sql_row_editor::{ColumnDescriptor, ColumnType, DiffTracker, EditorMode, RowSchema, RowSnapshot};
//!
//! let schema = RowSchema::new(
//!     "creature_template_movement",
//!     vec![
//!         ColumnDescriptor::new("CreatureId", ColumnType::Integer).primary_key(),
//!         ColumnDescriptor::new("Ground", ColumnType::Integer),
//!         ColumnDescriptor::new("Swim", ColumnType::Integer),
//!     ],
//! )
//! .unwrap();
//!
//! let mut tracker = DiffTracker::new(&schema, EditorMode::Edit);
//! tracker
//!     .load(RowSnapshot::new().with("CreatureId", 7).with("Ground", 1).with("Swim", 0))
//!     .unwrap();
//!
//! tracker.set_value("Swim", 2).unwrap();
//! assert_eq!(tracker.dirty_columns().unwrap(), vec!["Swim"]);
//! assert_eq!(
//!     tracker.partial_update().unwrap(),
//!     "UPDATE `creature_template_movement` SET `Swim` = 2 WHERE (`CreatureId` = 7);"
//! );
//!
//! tracker.set_value("Swim", 0).unwrap();
//! assert!(!tracker.is_dirty());
//! assert_eq!(tracker.partial_update().unwrap(), "");
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::Error;
use crate::schema::{ColumnDescriptor, TableDefinition};
use crate::snapshot::RowSnapshot;
use crate::statements;
use crate::value::Value;

/// Whether the session creates a new row or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorMode {
    /// The row does not exist yet; the full replace is the canonical statement.
    Create,
    /// The row exists; the partial update is the canonical statement.
    Edit,
}

/// The old and new value of a dirty column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnChange<'a> {
    /// The changed column.
    pub column: &'a ColumnDescriptor,
    /// The value in the original snapshot.
    pub old: &'a Value,
    /// The value in the current snapshot.
    pub new: &'a Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    original: RowSnapshot,
    current: RowSnapshot,
}

/// An editing session over one row of `T`.
///
/// Sessions hold no shared state; concurrent access to one session must be
/// serialized by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffTracker<T: TableDefinition> {
    schema: T,
    mode: EditorMode,
    session: Option<Session>,
}

impl<T: TableDefinition> DiffTracker<T> {
    /// Create an empty session; [`load`](Self::load) must be called before
    /// anything else.
    #[must_use]
    pub fn new(schema: T, mode: EditorMode) -> Self {
        Self {
            schema,
            mode,
            session: None,
        }
    }

    /// Create a session in [`EditorMode::Create`] loaded with `row`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn create(schema: T, row: RowSnapshot) -> Result<Self, Error> {
        let mut tracker = Self::new(schema, EditorMode::Create);
        tracker.load(row)?;
        Ok(tracker)
    }

    /// Create a session in [`EditorMode::Edit`] loaded with `original`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn edit(schema: T, original: RowSnapshot) -> Result<Self, Error> {
        let mut tracker = Self::new(schema, EditorMode::Edit);
        tracker.load(original)?;
        Ok(tracker)
    }

    /// The schema of the edited table.
    #[must_use]
    pub fn schema(&self) -> &T {
        &self.schema
    }

    /// The current editor mode.
    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Whether the session creates a new row.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.mode == EditorMode::Create
    }

    /// Whether a row has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Set the baseline row and reset the current row to a copy of it.
    ///
    /// Loading again discards the previous session.
    ///
    /// # Errors
    ///
    /// Any error of [`RowSnapshot::validate`]; the session is left untouched.
    pub fn load(&mut self, original: RowSnapshot) -> Result<(), Error> {
        original.validate(&self.schema)?;
        tracing::debug!(
            table = self.schema.table_name(),
            mode = ?self.mode,
            "loaded row baseline"
        );
        self.session = Some(Session {
            current: original.clone(),
            original,
        });
        Ok(())
    }

    fn session(&self) -> Result<&Session, Error> {
        self.session.as_ref().ok_or(Error::NotLoaded)
    }

    fn session_mut(&mut self) -> Result<&mut Session, Error> {
        self.session.as_mut().ok_or(Error::NotLoaded)
    }

    /// Overwrite the current value of `column`.
    ///
    /// Setting a column back to its original value makes it clean again.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    /// * `UnknownColumn` - `column` is not part of the schema.
    /// * Any error of [`ColumnDescriptor::check`].
    pub fn set_value(&mut self, column: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        self.session()?;
        let descriptor = self.schema.require_column(column)?;
        descriptor.check(&value)?;
        tracing::trace!(table = self.schema.table_name(), column, "set value");
        let name = String::from(descriptor.name());
        self.session_mut()?.current.set(name, value);
        Ok(())
    }

    /// The baseline snapshot.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn original(&self) -> Result<&RowSnapshot, Error> {
        Ok(&self.session()?.original)
    }

    /// The edited snapshot.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn current(&self) -> Result<&RowSnapshot, Error> {
        Ok(&self.session()?.current)
    }

    /// The baseline value of `column`.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    /// * `UnknownColumn` - `column` is not part of the schema.
    pub fn original_value(&self, column: &str) -> Result<&Value, Error> {
        let session = self.session()?;
        session.original.require(self.schema.require_column(column)?.name())
    }

    /// The edited value of `column`.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    /// * `UnknownColumn` - `column` is not part of the schema.
    pub fn current_value(&self, column: &str) -> Result<&Value, Error> {
        let session = self.session()?;
        session.current.require(self.schema.require_column(column)?.name())
    }

    /// The old and new values of every dirty column, in schema order.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn changes(&self) -> Result<Vec<ColumnChange<'_>>, Error> {
        let session = self.session()?;
        let mut changes = Vec::new();
        for column in self.schema.describe() {
            let old = session.original.require(column.name())?;
            let new = session.current.require(column.name())?;
            if old != new {
                changes.push(ColumnChange { column, old, new });
            }
        }
        Ok(changes)
    }

    /// Names of the columns whose current value differs from the original,
    /// in schema order.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn dirty_columns(&self) -> Result<Vec<&str>, Error> {
        Ok(self
            .changes()?
            .into_iter()
            .map(|change| change.column.name())
            .collect())
    }

    /// Whether any column differs from the original. `false` before a row is
    /// loaded.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.changes().is_ok_and(|changes| !changes.is_empty())
    }

    /// Discard every edit.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn revert(&mut self) -> Result<(), Error> {
        let session = self.session_mut()?;
        session.current = session.original.clone();
        tracing::debug!(table = self.schema.table_name(), "reverted all edits");
        Ok(())
    }

    /// Restore the original value of one column.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    /// * `UnknownColumn` - `column` is not part of the schema.
    pub fn revert_column(&mut self, column: &str) -> Result<(), Error> {
        let original = self.original_value(column)?.clone();
        self.set_value(column, original)
    }

    /// Accept the current row as the new baseline, typically after the
    /// canonical statement was executed. The session switches to
    /// [`EditorMode::Edit`] since the row now exists.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn commit(&mut self) -> Result<(), Error> {
        let session = self.session_mut()?;
        session.original = session.current.clone();
        self.mode = EditorMode::Edit;
        tracing::debug!(table = self.schema.table_name(), "committed row baseline");
        Ok(())
    }

    /// The primary key predicate built from the current row.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn primary_key_predicate(&self) -> Result<String, Error> {
        statements::primary_key_predicate(&self.schema, &self.session()?.current)
    }

    /// The `DELETE` + `INSERT` pair rewriting the whole current row.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn full_replace(&self) -> Result<String, Error> {
        let sql = statements::full_replace(&self.schema, &self.session()?.current)?;
        tracing::trace!(table = self.schema.table_name(), "synthesized full replace");
        Ok(sql)
    }

    /// The `UPDATE` of the dirty columns, or an empty string when nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn partial_update(&self) -> Result<String, Error> {
        let dirty = self.dirty_columns()?;
        let sql = statements::partial_update(&self.schema, &self.session()?.current, &dirty)?;
        tracing::trace!(
            table = self.schema.table_name(),
            dirty = dirty.len(),
            "synthesized partial update"
        );
        Ok(sql)
    }

    /// The statement to execute in the current mode: the full replace when
    /// creating, the partial update when editing.
    ///
    /// # Errors
    ///
    /// * `NotLoaded` - No row has been loaded.
    pub fn canonical_statement(&self) -> Result<String, Error> {
        match self.mode {
            EditorMode::Create => self.full_replace(),
            EditorMode::Edit => self.partial_update(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, RowSchema, ScalarType};
    use alloc::vec;

    fn schema() -> RowSchema {
        RowSchema::new(
            "creature_template_addon",
            vec![
                ColumnDescriptor::new("entry", ColumnType::Integer).primary_key(),
                ColumnDescriptor::new("path_id", ColumnType::Integer),
                ColumnDescriptor::new("mount", ColumnType::Integer),
                ColumnDescriptor::new("auras", ColumnType::collection(' ', ScalarType::Integer))
                    .nullable(),
            ],
        )
        .unwrap()
    }

    fn baseline() -> RowSnapshot {
        RowSnapshot::new()
            .with("entry", 1234)
            .with("path_id", 123)
            .with("mount", 0)
            .with("auras", Value::Null)
    }

    #[test]
    fn test_operations_before_load() {
        let mut tracker = DiffTracker::new(schema(), EditorMode::Edit);
        assert!(!tracker.is_loaded());
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.dirty_columns(), Err(Error::NotLoaded));
        assert_eq!(tracker.full_replace(), Err(Error::NotLoaded));
        assert_eq!(tracker.partial_update(), Err(Error::NotLoaded));
        assert_eq!(tracker.primary_key_predicate(), Err(Error::NotLoaded));
        assert_eq!(tracker.set_value("path_id", 1), Err(Error::NotLoaded));
        assert_eq!(tracker.commit(), Err(Error::NotLoaded));
    }

    #[test]
    fn test_load_rejects_invalid_row_and_keeps_session() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        tracker.set_value("mount", 5).unwrap();

        let invalid = baseline().with("mount", "five");
        assert!(matches!(tracker.load(invalid), Err(Error::TypeMismatch { .. })));
        assert_eq!(tracker.dirty_columns().unwrap(), vec!["mount"]);
    }

    #[test]
    fn test_set_value_errors() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        assert_eq!(
            tracker.set_value("bogus", 1),
            Err(Error::UnknownColumn("bogus".into()))
        );
        assert_eq!(
            tracker.set_value("path_id", Value::Null),
            Err(Error::NullNotAllowed("path_id".into()))
        );
        assert!(matches!(
            tracker.set_value("path_id", "3"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn test_dirty_columns_follow_schema_order() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        tracker.set_value("auras", vec![1i64]).unwrap();
        tracker.set_value("path_id", 3).unwrap();
        assert_eq!(tracker.dirty_columns().unwrap(), vec!["path_id", "auras"]);
    }

    #[test]
    fn test_reversion_clears_dirtiness() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        tracker.set_value("path_id", 3).unwrap();
        assert!(tracker.is_dirty());
        tracker.set_value("path_id", 123).unwrap();
        assert!(!tracker.is_dirty());
        assert!(tracker.dirty_columns().unwrap().is_empty());
    }

    #[test]
    fn test_changes_expose_old_and_new() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        tracker.set_value("mount", 7).unwrap();
        let changes = tracker.changes().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column.name(), "mount");
        assert_eq!(changes[0].old, &Value::Integer(0));
        assert_eq!(changes[0].new, &Value::Integer(7));
        assert_eq!(tracker.original_value("mount").unwrap(), &Value::Integer(0));
        assert_eq!(tracker.current_value("mount").unwrap(), &Value::Integer(7));
    }

    #[test]
    fn test_revert_and_revert_column() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        tracker.set_value("mount", 7).unwrap();
        tracker.set_value("path_id", 8).unwrap();

        tracker.revert_column("mount").unwrap();
        assert_eq!(tracker.dirty_columns().unwrap(), vec!["path_id"]);

        tracker.revert().unwrap();
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.current().unwrap(), tracker.original().unwrap());
    }

    #[test]
    fn test_commit_moves_baseline_and_switches_mode() {
        let row = RowSnapshot::defaults(&schema()).with("entry", 1);
        let mut tracker = DiffTracker::create(schema(), row).unwrap();
        assert!(tracker.is_new());
        tracker.set_value("path_id", 4).unwrap();
        assert!(tracker.is_dirty());

        tracker.commit().unwrap();
        assert_eq!(tracker.mode(), EditorMode::Edit);
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.original_value("path_id").unwrap(), &Value::Integer(4));
        assert_eq!(tracker.canonical_statement().unwrap(), "");
    }

    #[test]
    fn test_predicate_uses_current_key() {
        let mut tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        tracker.set_value("entry", 99).unwrap();
        assert_eq!(
            tracker.primary_key_predicate().unwrap(),
            "WHERE (`entry` = 99)"
        );
        assert_eq!(
            tracker.partial_update().unwrap(),
            "UPDATE `creature_template_addon` SET `entry` = 99 WHERE (`entry` = 99);"
        );
    }

    #[test]
    fn test_canonical_statement_per_mode() {
        let mut tracker = DiffTracker::new(schema(), EditorMode::Create);
        tracker.load(baseline()).unwrap();
        assert_eq!(
            tracker.canonical_statement().unwrap(),
            tracker.full_replace().unwrap()
        );

        let tracker = DiffTracker::edit(schema(), baseline()).unwrap();
        assert_eq!(tracker.canonical_statement().unwrap(), "");
    }
}
