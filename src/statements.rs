//! SQL statement synthesis.
//!
//! Pure functions turning a schema and row snapshots into statement text.
//! Every column and value goes through [`quote_identifier`] and
//! [`format_literal`], so the output uses backtick identifiers, single-quoted
//! escaped strings and bare `NULL`, and terminates statements with `;`.
//!
//! The trackers ([`DiffTracker`](crate::DiffTracker) and
//! [`RowSetTracker`](crate::RowSetTracker)) expose these as methods; the free
//! functions are useful when the host keeps its own snapshots.
//!
//! # Example
//!
//! ```rust
//! use sql_row_editor::{ColumnDescriptor, ColumnType, RowSchema, RowSnapshot, statements};
//!
//! let schema = RowSchema::new(
//!     "creature_template_movement",
//!     vec![
//!         ColumnDescriptor::new("CreatureId", ColumnType::Integer).primary_key(),
//!         ColumnDescriptor::new("Ground", ColumnType::Integer),
//!     ],
//! )
//! .unwrap();
//! let row = RowSnapshot::new().with("CreatureId", 7).with("Ground", 1);
//!
//! let sql = statements::partial_update(&schema, &row, &["Ground"]).unwrap();
//! assert_eq!(
//!     sql,
//!     "UPDATE `creature_template_movement` SET `Ground` = 1 WHERE (`CreatureId` = 7);"
//! );
//! ```

use alloc::string::String;

use crate::errors::Error;
use crate::schema::{ColumnDescriptor, TableDefinition};
use crate::snapshot::RowSnapshot;
use crate::value::{format_literal, quote_identifier};

/// Format the literal of `column` taken from `row`.
fn column_literal(column: &ColumnDescriptor, row: &RowSnapshot) -> Result<String, Error> {
    format_literal(row.require(column.name())?, column)
}

/// Append `` `column` = literal `` to `sql`.
fn push_assignment(sql: &mut String, column: &ColumnDescriptor, row: &RowSnapshot) -> Result<(), Error> {
    sql.push_str(&quote_identifier(column.name()));
    sql.push_str(" = ");
    sql.push_str(&column_literal(column, row)?);
    Ok(())
}

/// Append the parenthesized, comma separated value tuple of `row`.
fn push_value_tuple<T: TableDefinition>(sql: &mut String, schema: &T, row: &RowSnapshot) -> Result<(), Error> {
    sql.push('(');
    for (i, column) in schema.describe().iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&column_literal(column, row)?);
    }
    sql.push(')');
    Ok(())
}

/// Render the primary key predicate of `row`.
///
/// The key columns are combined with `AND` in declaration order and wrapped
/// in a single pair of parentheses, also for single-column keys:
///
/// ```text
/// WHERE (`entry` = 1234)
/// WHERE (`Entry` = 1234 AND `Item` = 5)
/// ```
///
/// # Errors
///
/// * `MissingColumn` - `row` lacks a key column.
/// * Any error of [`format_literal`].
pub fn primary_key_predicate<T: TableDefinition>(schema: &T, row: &RowSnapshot) -> Result<String, Error> {
    let mut sql = String::from("WHERE (");
    for (i, column) in schema.primary_key_columns().into_iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        push_assignment(&mut sql, column, row)?;
    }
    sql.push(')');
    Ok(sql)
}

/// Render the `DELETE` statement removing the row identified by `row`.
///
/// # Errors
///
/// Same as [`primary_key_predicate`].
pub fn delete<T: TableDefinition>(schema: &T, row: &RowSnapshot) -> Result<String, Error> {
    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&quote_identifier(schema.table_name()));
    sql.push(' ');
    sql.push_str(&primary_key_predicate(schema, row)?);
    sql.push(';');
    Ok(sql)
}

/// Render one `INSERT` statement carrying every row of `rows`.
///
/// Rows are separated by `,` and a newline, and the value list starts on its
/// own line:
///
/// ```text
/// INSERT INTO `t` (`a`, `b`) VALUES
/// (1, 2),
/// (3, 4);
/// ```
///
/// With no rows there is nothing to insert, and the result is empty.
///
/// # Errors
///
/// * `MissingColumn` - A row lacks a schema column.
/// * Any error of [`format_literal`].
pub fn insert<'r, T, I>(schema: &T, rows: I) -> Result<String, Error>
where
    T: TableDefinition,
    I: IntoIterator<Item = &'r RowSnapshot>,
{
    let mut rows = rows.into_iter().peekable();
    if rows.peek().is_none() {
        return Ok(String::new());
    }
    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&quote_identifier(schema.table_name()));
    sql.push_str(" (");
    for (i, column) in schema.describe().iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&quote_identifier(column.name()));
    }
    sql.push_str(") VALUES\n");
    for (i, row) in rows.enumerate() {
        if i > 0 {
            sql.push_str(",\n");
        }
        push_value_tuple(&mut sql, schema, row)?;
    }
    sql.push(';');
    Ok(sql)
}

/// Render the full replace of `row`: a `DELETE` by primary key followed, on
/// the next line, by an `INSERT` of every column.
///
/// # Errors
///
/// * `MissingColumn` - `row` lacks a schema column.
/// * Any error of [`format_literal`].
pub fn full_replace<T: TableDefinition>(schema: &T, row: &RowSnapshot) -> Result<String, Error> {
    let mut sql = delete(schema, row)?;
    sql.push('\n');
    sql.push_str(&insert(schema, [row])?);
    Ok(sql)
}

/// Render an `UPDATE` of the `dirty` columns of `row`.
///
/// `dirty` is rendered in the given order; the trackers pass it in schema
/// order. An empty `dirty` slice yields an empty string rather than an
/// invalid `UPDATE ... SET ;`.
///
/// # Errors
///
/// * `UnknownColumn` - A dirty column is not part of the schema.
/// * `MissingColumn` - `row` lacks a dirty or key column.
/// * Any error of [`format_literal`].
pub fn partial_update<T: TableDefinition>(
    schema: &T,
    row: &RowSnapshot,
    dirty: &[&str],
) -> Result<String, Error> {
    if dirty.is_empty() {
        return Ok(String::new());
    }

    let mut sql = String::from("UPDATE ");
    sql.push_str(&quote_identifier(schema.table_name()));
    sql.push_str(" SET ");
    for (i, name) in dirty.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        push_assignment(&mut sql, schema.require_column(name)?, row)?;
    }
    sql.push(' ');
    sql.push_str(&primary_key_predicate(schema, row)?);
    sql.push(';');
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, RowSchema, ScalarType};
    use alloc::vec;

    fn loot_schema() -> RowSchema {
        RowSchema::new(
            "creature_loot_template",
            vec![
                ColumnDescriptor::new("Entry", ColumnType::Integer).primary_key(),
                ColumnDescriptor::new("Item", ColumnType::Integer).primary_key(),
                ColumnDescriptor::new("Chance", ColumnType::Float),
                ColumnDescriptor::new("Comment", ColumnType::Text).nullable(),
            ],
        )
        .unwrap()
    }

    fn loot_row() -> RowSnapshot {
        RowSnapshot::new()
            .with("Entry", 1234)
            .with("Item", 5)
            .with("Chance", 0.5)
            .with("Comment", "Ogre's club")
    }

    #[test]
    fn test_composite_predicate() {
        assert_eq!(
            primary_key_predicate(&loot_schema(), &loot_row()).unwrap(),
            "WHERE (`Entry` = 1234 AND `Item` = 5)"
        );
    }

    #[test]
    fn test_full_replace_layout() {
        assert_eq!(
            full_replace(&loot_schema(), &loot_row()).unwrap(),
            "DELETE FROM `creature_loot_template` WHERE (`Entry` = 1234 AND `Item` = 5);\n\
             INSERT INTO `creature_loot_template` (`Entry`, `Item`, `Chance`, `Comment`) VALUES\n\
             (1234, 5, 0.5, 'Ogre''s club');"
        );
    }

    #[test]
    fn test_multi_row_insert() {
        let second = loot_row().with("Item", 6).with("Comment", None::<&str>);
        assert_eq!(
            insert(&loot_schema(), [&loot_row(), &second]).unwrap(),
            "INSERT INTO `creature_loot_template` (`Entry`, `Item`, `Chance`, `Comment`) VALUES\n\
             (1234, 5, 0.5, 'Ogre''s club'),\n\
             (1234, 6, 0.5, NULL);"
        );
    }

    #[test]
    fn test_insert_without_rows_is_empty() {
        let rows: alloc::vec::Vec<&RowSnapshot> = alloc::vec::Vec::new();
        assert_eq!(insert(&loot_schema(), rows).unwrap(), "");
    }

    #[test]
    fn test_partial_update_respects_given_order() {
        assert_eq!(
            partial_update(&loot_schema(), &loot_row(), &["Chance", "Comment"]).unwrap(),
            "UPDATE `creature_loot_template` SET `Chance` = 0.5, `Comment` = 'Ogre''s club' \
             WHERE (`Entry` = 1234 AND `Item` = 5);"
        );
    }

    #[test]
    fn test_partial_update_without_dirty_columns_is_empty() {
        assert_eq!(partial_update(&loot_schema(), &loot_row(), &[]).unwrap(), "");
    }

    #[test]
    fn test_partial_update_rejects_unknown_column() {
        assert_eq!(
            partial_update(&loot_schema(), &loot_row(), &["Bogus"]),
            Err(Error::UnknownColumn("Bogus".into()))
        );
    }

    #[test]
    fn test_missing_key_value() {
        let row = RowSnapshot::new().with("Entry", 1);
        assert_eq!(
            primary_key_predicate(&loot_schema(), &row),
            Err(Error::MissingColumn("Item".into()))
        );
    }

    #[test]
    fn test_collection_column_in_insert() {
        let schema = RowSchema::new(
            "creature_addon",
            vec![
                ColumnDescriptor::new("guid", ColumnType::Integer).primary_key(),
                ColumnDescriptor::new("auras", ColumnType::collection(' ', ScalarType::Integer))
                    .nullable(),
            ],
        )
        .unwrap();
        let row = RowSnapshot::new().with("guid", 9).with("auras", vec![10i64, 20]);
        assert_eq!(
            insert(&schema, [&row]).unwrap(),
            "INSERT INTO `creature_addon` (`guid`, `auras`) VALUES\n(9, '10 20');"
        );
    }
}
