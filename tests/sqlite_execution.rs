//! Execution of synthesized statements against an in-memory SQLite database.
//!
//! The statements are written for MySQL, but the subset this crate emits is
//! understood by SQLite as well, so running them through `rusqlite` checks
//! that they are syntactically valid and that they leave the table holding
//! exactly the edited rows. Requires the `testing` feature.

#![cfg(feature = "testing")]

use arbitrary::{Arbitrary, Unstructured};
use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sql_row_editor::testing::{
    EditScript, create_table_sql, fetch_rows, fixture_schema, open_database, test_edit_session,
};
use sql_row_editor::{DiffTracker, RowSetTracker, RowSnapshot, TableDefinition, Value};

fn fixture_row(entry: i64) -> RowSnapshot {
    RowSnapshot::defaults(&fixture_schema()).with("entry", entry)
}

#[test]
fn test_create_table_sql() {
    assert_eq!(
        create_table_sql(&fixture_schema()),
        "CREATE TABLE `creature_template_addon` (`entry` INTEGER NOT NULL, \
         `path_id` INTEGER NOT NULL, `emote` INTEGER NOT NULL, `isLarge` INTEGER NOT NULL, \
         `scale` REAL NOT NULL, `comment` TEXT, `auras` TEXT, `tags` TEXT NOT NULL, \
         PRIMARY KEY (`entry`));"
    );
}

#[test]
fn test_create_then_edit() {
    let schema = fixture_schema();
    let mut conn = open_database(&schema);

    let mut tracker = DiffTracker::create(&schema, fixture_row(1234)).unwrap();
    tracker.set_value("comment", "O'Brien's \"mount\"").unwrap();
    tracker.set_value("tags", vec!["rare", "elite"]).unwrap();
    assert!(tracker.execute(&mut conn).unwrap());
    assert_eq!(fetch_rows(&conn, &schema).unwrap(), vec![tracker.current().unwrap().clone()]);

    tracker.set_value("scale", 1.25).unwrap();
    tracker.set_value("isLarge", true).unwrap();
    tracker.set_value("auras", vec![6i64, -7]).unwrap();
    assert!(tracker.canonical_statement().unwrap().starts_with("UPDATE"));
    assert!(tracker.execute(&mut conn).unwrap());

    let stored = fetch_rows(&conn, &schema).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get("scale"), Some(&Value::Real(1.25)));
    assert_eq!(stored[0].get("auras"), Some(&Value::from(vec![6i64, -7])));
    assert_eq!(stored[0], *tracker.current().unwrap());
}

#[test]
fn test_update_leaves_other_rows_alone() {
    let schema = fixture_schema();
    let mut conn = open_database(&schema);
    for entry in [1, 2, 3] {
        let mut tracker = DiffTracker::create(&schema, fixture_row(entry)).unwrap();
        tracker.execute(&mut conn).unwrap();
    }

    let mut tracker = DiffTracker::edit(&schema, fixture_row(2)).unwrap();
    tracker.set_value("emote", 9).unwrap();
    tracker.execute(&mut conn).unwrap();

    let emotes: Vec<Value> = fetch_rows(&conn, &schema)
        .unwrap()
        .iter()
        .map(|row| row.get("emote").unwrap().clone())
        .collect();
    assert_eq!(emotes, vec![Value::Integer(0), Value::Integer(9), Value::Integer(0)]);
}

#[test]
fn test_full_replace_rewrites_an_existing_row() {
    let schema = fixture_schema();
    let mut conn = open_database(&schema);
    DiffTracker::create(&schema, fixture_row(5))
        .unwrap()
        .execute(&mut conn)
        .unwrap();

    // A create session over an existing key replaces the row instead of failing.
    let mut tracker = DiffTracker::create(&schema, fixture_row(5)).unwrap();
    tracker.set_value("path_id", 77).unwrap();
    tracker.execute(&mut conn).unwrap();

    let stored = fetch_rows(&conn, &schema).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get("path_id"), Some(&Value::Integer(77)));
}

#[test]
fn test_row_group_diff_applies() {
    let schema = fixture_schema();
    let mut conn = open_database(&schema);
    let group_row = |entry: i64| fixture_row(entry).with("path_id", 10);

    let mut tracker = RowSetTracker::new(&schema, "path_id", "entry").unwrap();
    tracker.load(10, Vec::new()).unwrap();
    for entry in 1..=4 {
        tracker.add_row(group_row(entry)).unwrap();
    }
    assert!(tracker.execute(&mut conn).unwrap());
    assert_eq!(fetch_rows(&conn, &schema).unwrap().len(), 4);

    tracker.remove_row(2).unwrap();
    tracker.set_value(3, "emote", 4).unwrap();
    tracker.add_row(group_row(9)).unwrap();
    assert!(tracker.execute(&mut conn).unwrap());

    let expected: Vec<RowSnapshot> = tracker.rows().unwrap().into_iter().cloned().collect();
    let mut stored = fetch_rows(&conn, &schema).unwrap();
    stored.sort_by_key(|row| match row.get("entry") {
        Some(Value::Integer(entry)) => *entry,
        _ => 0,
    });
    assert_eq!(stored, expected);
    assert_eq!(tracker.schema().table_name(), "creature_template_addon");
}

#[test]
fn test_random_edit_sessions() {
    let mut rng = StdRng::seed_from_u64(20240607);
    let mut replayed = 0;
    for _ in 0..200 {
        let len = rng.random_range(64..1024);
        let bytes: Vec<u8> = (0..len).map(|_| rng.random_range(0..=255u8)).collect();
        let Ok(script) = EditScript::arbitrary(&mut Unstructured::new(&bytes)) else {
            continue;
        };
        test_edit_session(&script);
        replayed += 1;
    }
    assert!(replayed > 0);
}
