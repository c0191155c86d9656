//! Testing utilities for checking synthesized statements against SQLite.
//!
//! This module is gated behind the `testing` feature.
//!
//! # Provided helpers
//!
//! - [`create_table_sql`]: render a `CREATE TABLE` statement for a schema
//! - [`open_database`]: open an in-memory database holding an empty table
//! - [`fetch_rows`]: read every row of a table back into snapshots
//! - [`arbitrary_value`]: generate a value a column accepts
//! - [`EditScript`] and [`test_edit_session`]: replay a random edit session,
//!   shared by the `edit_session` fuzz target and the regression tests
//!
//! Statements are produced in the MySQL dialect, but everything this crate
//! emits (backtick identifiers, doubled quotes, `0`/`1` booleans) is also
//! understood by SQLite, which makes an in-memory connection a convenient
//! oracle.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use arbitrary::{Arbitrary, Unstructured};
use rusqlite::Connection;
use rusqlite::types::Type;

use crate::runner::QueryRunner;
use crate::schema::{ColumnDescriptor, ColumnType, RowSchema, ScalarType, TableDefinition};
use crate::snapshot::RowSnapshot;
use crate::tracker::DiffTracker;
use crate::value::{Value, quote_identifier};

impl QueryRunner for Connection {
    type Error = rusqlite::Error;

    fn query(&mut self, sql: &str) -> Result<(), Self::Error> {
        self.execute_batch(sql)
    }
}

fn storage_class(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        ColumnType::Float => "REAL",
        ColumnType::Text | ColumnType::Collection { .. } => "TEXT",
    }
}

/// Render the `CREATE TABLE` statement of `schema`.
///
/// Booleans are stored as integers and collections as their delimited text.
#[must_use]
pub fn create_table_sql<T: TableDefinition>(schema: &T) -> String {
    let mut definitions: Vec<String> = schema
        .describe()
        .iter()
        .map(|column| {
            let mut definition = format!(
                "{} {}",
                quote_identifier(column.name()),
                storage_class(column.column_type())
            );
            if !column.is_nullable() {
                definition.push_str(" NOT NULL");
            }
            definition
        })
        .collect();
    let keys: Vec<String> = schema
        .primary_key_columns()
        .iter()
        .map(|column| quote_identifier(column.name()))
        .collect();
    definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    format!(
        "CREATE TABLE {} ({});",
        quote_identifier(schema.table_name()),
        definitions.join(", ")
    )
}

/// Open an in-memory database holding the empty table of `schema`.
///
/// # Panics
///
/// Panics if the database cannot be opened or the table cannot be created.
#[must_use]
pub fn open_database<T: TableDefinition>(schema: &T) -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    conn.execute_batch(&create_table_sql(schema))
        .expect("Failed to create table");
    conn
}

fn parse_element(piece: &str, element: ScalarType) -> Option<Value> {
    match element {
        ScalarType::Integer => piece.parse().ok().map(Value::Integer),
        ScalarType::Float => piece.parse().ok().map(Value::Real),
        ScalarType::Text => Some(Value::Text(piece.to_string())),
    }
}

fn read_column(row: &rusqlite::Row<'_>, index: usize, column: &ColumnDescriptor) -> rusqlite::Result<Value> {
    let value = match column.column_type() {
        ColumnType::Integer => row.get::<_, Option<i64>>(index)?.map(Value::Integer),
        ColumnType::Float => row.get::<_, Option<f64>>(index)?.map(Value::Real),
        ColumnType::Text => row.get::<_, Option<String>>(index)?.map(Value::Text),
        ColumnType::Boolean => row
            .get::<_, Option<i64>>(index)?
            .map(|flag| Value::Boolean(flag != 0)),
        ColumnType::Collection { delimiter, element } => match row.get::<_, Option<String>>(index)? {
            None => None,
            Some(text) => Some(Value::List(
                text.split(delimiter)
                    .filter(|piece| !piece.is_empty())
                    .map(|piece| parse_element(piece, element))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        rusqlite::Error::InvalidColumnType(index, column.name().to_string(), Type::Text)
                    })?,
            )),
        },
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Read every row of the table of `schema`, ordered by primary key.
///
/// # Errors
///
/// Any error reported by SQLite, or `InvalidColumnType` when a collection
/// element cannot be parsed back.
pub fn fetch_rows<T: TableDefinition>(conn: &Connection, schema: &T) -> rusqlite::Result<Vec<RowSnapshot>> {
    let columns: Vec<String> = schema
        .describe()
        .iter()
        .map(|column| quote_identifier(column.name()))
        .collect();
    let keys: Vec<String> = schema
        .primary_key_columns()
        .iter()
        .map(|column| quote_identifier(column.name()))
        .collect();
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        columns.join(", "),
        quote_identifier(schema.table_name()),
        keys.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        let mut snapshot = RowSnapshot::new();
        for (index, column) in schema.describe().iter().enumerate() {
            snapshot.set(column.name(), read_column(row, index, column)?);
        }
        Ok(snapshot)
    })?;
    rows.collect()
}

/// Generate a value `column` accepts.
///
/// Numbers are kept in ranges whose SQL rendering SQLite parses back to the
/// same bits: integers fit in 32 bits and floats are quarters.
///
/// # Errors
///
/// Returns an error if `u` runs out of data in a way `arbitrary` reports.
pub fn arbitrary_value(column: &ColumnDescriptor, u: &mut Unstructured<'_>) -> arbitrary::Result<Value> {
    if column.is_nullable() && u.ratio(1u8, 4u8)? {
        return Ok(Value::Null);
    }
    Ok(match column.column_type() {
        ColumnType::Integer => arbitrary_scalar(ScalarType::Integer, None, u)?,
        ColumnType::Float => arbitrary_scalar(ScalarType::Float, None, u)?,
        ColumnType::Text => arbitrary_scalar(ScalarType::Text, None, u)?,
        ColumnType::Boolean => Value::Boolean(u.arbitrary()?),
        ColumnType::Collection { delimiter, element } => {
            let len = u.int_in_range(0..=4)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(arbitrary_scalar(element, Some(delimiter), u)?);
            }
            Value::List(items)
        }
    })
}

fn arbitrary_scalar(
    scalar: ScalarType,
    delimiter: Option<char>,
    u: &mut Unstructured<'_>,
) -> arbitrary::Result<Value> {
    Ok(match scalar {
        ScalarType::Integer => Value::Integer(i64::from(u.arbitrary::<i32>()?)),
        ScalarType::Float => Value::Real(f64::from(u.arbitrary::<i16>()?) / 4.0),
        ScalarType::Text => {
            let raw: String = u.arbitrary()?;
            // SQLite stops reading a statement at NUL.
            let mut text: String = raw
                .chars()
                .filter(|&c| c != '\0' && Some(c) != delimiter)
                .collect();
            // Empty collection elements do not survive the delimited text form.
            if delimiter.is_some() && text.is_empty() {
                text.push('x');
            }
            Value::Text(text)
        }
    })
}

/// The table the edit sessions run against.
#[must_use]
pub fn fixture_schema() -> RowSchema {
    RowSchema::new(
        "creature_template_addon",
        alloc::vec![
            ColumnDescriptor::new("entry", ColumnType::Integer).primary_key(),
            ColumnDescriptor::new("path_id", ColumnType::Integer),
            ColumnDescriptor::new("emote", ColumnType::Integer),
            ColumnDescriptor::new("isLarge", ColumnType::Boolean),
            ColumnDescriptor::new("scale", ColumnType::Float),
            ColumnDescriptor::new("comment", ColumnType::Text).nullable(),
            ColumnDescriptor::new("auras", ColumnType::collection(' ', ScalarType::Integer))
                .nullable(),
            ColumnDescriptor::new("tags", ColumnType::collection(',', ScalarType::Text)),
        ],
    )
    .expect("Fixture schema is valid")
}

/// One action of an [`EditScript`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditStep {
    /// Set a non-key column.
    Set(String, Value),
    /// Restore the original value of a column.
    RevertColumn(String),
    /// Discard every edit.
    Revert,
    /// Execute the canonical statement against the database.
    Execute,
}

/// A random edit session over [`fixture_schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditScript {
    /// The row the session starts from, created in the database first.
    pub original: RowSnapshot,
    /// The actions replayed on the session.
    pub steps: Vec<EditStep>,
}

impl<'a> Arbitrary<'a> for EditScript {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let schema = fixture_schema();
        let mut original = RowSnapshot::new();
        for column in schema.describe() {
            original.set(column.name(), arbitrary_value(column, u)?);
        }

        let editable: Vec<&ColumnDescriptor> = schema
            .describe()
            .iter()
            .filter(|column| !column.is_primary_key())
            .collect();
        let len = u.int_in_range(0..=16)?;
        let mut steps = Vec::with_capacity(len);
        for _ in 0..len {
            let column = *u.choose(&editable)?;
            steps.push(match u.int_in_range(0..=9u8)? {
                0..=5 => EditStep::Set(column.name().to_string(), arbitrary_value(column, u)?),
                6 | 7 => EditStep::RevertColumn(column.name().to_string()),
                8 => EditStep::Revert,
                _ => EditStep::Execute,
            });
        }
        Ok(Self { original, steps })
    }
}

/// Check the tracker invariants that must hold after every step.
fn assert_session_consistent(tracker: &DiffTracker<&RowSchema>) {
    let original = tracker.original().expect("Session is loaded");
    let current = tracker.current().expect("Session is loaded");
    let expected: Vec<&str> = tracker
        .schema()
        .describe()
        .iter()
        .filter(|column| original.get(column.name()) != current.get(column.name()))
        .map(ColumnDescriptor::name)
        .collect();
    let dirty = tracker.dirty_columns().expect("Session is loaded");
    assert_eq!(dirty, expected, "Dirty set must be exactly the changed columns");
    assert_eq!(tracker.is_dirty(), !dirty.is_empty());

    let update = tracker.partial_update().expect("Session is loaded");
    assert_eq!(update.is_empty(), dirty.is_empty());
    for column in &dirty {
        assert!(
            update.contains(&quote_identifier(column)),
            "Update must set dirty column {column}: {update}"
        );
    }
    assert_eq!(
        tracker.full_replace().expect("Session is loaded"),
        tracker.full_replace().expect("Session is loaded"),
        "Synthesis must be deterministic"
    );
}

/// Replay `script` on a tracker created in create mode, executing against an
/// in-memory SQLite database, and check the database always matches the
/// committed row.
///
/// # Panics
///
/// Panics if any invariant is violated.
pub fn test_edit_session(script: &EditScript) {
    let schema = fixture_schema();
    let mut conn = open_database(&schema);
    let mut tracker =
        DiffTracker::create(&schema, script.original.clone()).expect("Generated row is valid");
    assert_session_consistent(&tracker);

    for step in &script.steps {
        match step {
            EditStep::Set(column, value) => tracker
                .set_value(column, value.clone())
                .expect("Generated value is valid"),
            EditStep::RevertColumn(column) => tracker
                .revert_column(column)
                .expect("Column exists"),
            EditStep::Revert => tracker.revert().expect("Session is loaded"),
            EditStep::Execute => {
                let statement = tracker.canonical_statement().expect("Session is loaded");
                tracker
                    .execute(&mut conn)
                    .unwrap_or_else(|error| panic!("Failed to execute {statement:?}: {error}"));
                assert!(!tracker.is_dirty());
            }
        }
        assert_session_consistent(&tracker);
    }

    tracker.execute(&mut conn).expect("Final statement executes");
    let stored = fetch_rows(&conn, &schema).expect("Rows can be read back");
    assert_eq!(
        stored,
        alloc::vec![tracker.current().expect("Session is loaded").clone()],
        "Database must hold exactly the committed row"
    );
}
