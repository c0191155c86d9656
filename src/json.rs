//! Conversion of JSON rows into typed snapshots.
//!
//! Query gateways usually return rows as JSON objects whose values only
//! loosely follow the column types: tinyint flags come back as numbers,
//! delimited collections as strings, and some drivers send large integers as
//! strings. This module performs that coercion once, at the boundary, so the
//! trackers can compare values strictly.
//!
//! # Example
//!
//! ```rust
//! use sql_row_editor::{ColumnDescriptor, ColumnType, RowSchema, RowSnapshot, ScalarType, Value};
//!
//! let schema = RowSchema::new(
//!     "creature_template_addon",
//!     vec![
//!         ColumnDescriptor::new("entry", ColumnType::Integer).primary_key(),
//!         ColumnDescriptor::new("isLarge", ColumnType::Boolean),
//!         ColumnDescriptor::new("auras", ColumnType::collection(' ', ScalarType::Integer)).nullable(),
//!     ],
//! )
//! .unwrap();
//!
//! let row = RowSnapshot::from_json_str(&schema, r#"{"entry": 1234, "isLarge": 0, "auras": "6 7"}"#)
//!     .unwrap();
//! assert_eq!(row.get("isLarge"), Some(&Value::Boolean(false)));
//! assert_eq!(row.get("auras"), Some(&Value::from(vec![6i64, 7])));
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde_json::{Map, Value as Json};

use crate::errors::Error;
use crate::schema::{ColumnDescriptor, ColumnType, ScalarType, TableDefinition};
use crate::snapshot::RowSnapshot;
use crate::value::Value;

/// Name of a JSON kind, used in error messages.
fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn unsupported(column: &ColumnDescriptor, json: &Json) -> Error {
    Error::UnsupportedJson {
        column: column.name().into(),
        found: json_kind(json),
    }
}

fn scalar_from_json(column: &ColumnDescriptor, scalar: ScalarType, json: &Json) -> Result<Value, Error> {
    match (scalar, json) {
        (ScalarType::Integer, Json::Number(n)) => {
            n.as_i64().map(Value::Integer).ok_or_else(|| unsupported(column, json))
        }
        (ScalarType::Integer, Json::String(s)) => s
            .trim()
            .parse()
            .map(Value::Integer)
            .map_err(|_| unsupported(column, json)),
        (ScalarType::Float, Json::Number(n)) => {
            n.as_f64().map(Value::Real).ok_or_else(|| unsupported(column, json))
        }
        (ScalarType::Float, Json::String(s)) => s
            .trim()
            .parse()
            .map(Value::Real)
            .map_err(|_| unsupported(column, json)),
        (ScalarType::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
        (ScalarType::Text, Json::Number(n)) => Ok(Value::Text(n.to_string())),
        _ => Err(unsupported(column, json)),
    }
}

/// Convert one JSON value to the type of `column`.
///
/// Booleans accept JSON booleans and numbers (any non-zero number is true).
/// Collections accept a delimited string, split on the column delimiter with
/// empty pieces dropped, or a JSON array.
///
/// The result is not checked against the column; the snapshot built from it
/// is, when it enters a tracker.
///
/// # Errors
///
/// * `UnsupportedJson` - The JSON value cannot represent the column type.
pub fn value_from_json(column: &ColumnDescriptor, json: &Json) -> Result<Value, Error> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    match column.column_type() {
        ColumnType::Integer => scalar_from_json(column, ScalarType::Integer, json),
        ColumnType::Float => scalar_from_json(column, ScalarType::Float, json),
        ColumnType::Text => scalar_from_json(column, ScalarType::Text, json),
        ColumnType::Boolean => match json {
            Json::Bool(b) => Ok(Value::Boolean(*b)),
            Json::Number(n) => Ok(Value::Boolean(n.as_f64().is_some_and(|v| v != 0.0))),
            _ => Err(unsupported(column, json)),
        },
        ColumnType::Collection { delimiter, element } => match json {
            Json::String(s) => s
                .split(delimiter)
                .filter(|piece| !piece.is_empty())
                .map(|piece| scalar_from_json(column, element, &Json::String(String::from(piece))))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Json::Array(items) => items
                .iter()
                .map(|item| scalar_from_json(column, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            _ => Err(unsupported(column, json)),
        },
    }
}

impl RowSnapshot {
    /// Build a snapshot from a JSON object, converting every schema column.
    ///
    /// Keys absent from the schema are ignored, since gateways often return
    /// extra columns (for instance a `VerifiedBuild` the editor does not
    /// manage).
    ///
    /// # Errors
    ///
    /// * `MissingColumn` - The object lacks a schema column.
    /// * `UnsupportedJson` - A value cannot represent its column type.
    pub fn from_json<T: TableDefinition>(schema: &T, object: &Map<String, Json>) -> Result<Self, Error> {
        let mut row = RowSnapshot::new();
        for column in schema.describe() {
            let json = object
                .get(column.name())
                .ok_or_else(|| Error::MissingColumn(column.name().into()))?;
            row.set(column.name(), value_from_json(column, json)?);
        }
        Ok(row)
    }

    /// Parse `text` as a JSON object and convert it with [`from_json`](Self::from_json).
    ///
    /// # Errors
    ///
    /// * `MalformedJson` - `text` is not valid JSON.
    /// * `UnsupportedJson` - `text` is valid JSON but not an object.
    /// * Any error of [`from_json`](Self::from_json).
    pub fn from_json_str<T: TableDefinition>(schema: &T, text: &str) -> Result<Self, Error> {
        let parsed: Json =
            serde_json::from_str(text).map_err(|err| Error::MalformedJson(err.to_string()))?;
        match &parsed {
            Json::Object(object) => Self::from_json(schema, object),
            other => Err(Error::UnsupportedJson {
                column: String::new(),
                found: json_kind(other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RowSchema;
    use alloc::vec;

    fn schema() -> RowSchema {
        RowSchema::new(
            "creature_template_addon",
            vec![
                ColumnDescriptor::new("entry", ColumnType::Integer).primary_key(),
                ColumnDescriptor::new("path_id", ColumnType::Integer),
                ColumnDescriptor::new("isLarge", ColumnType::Boolean),
                ColumnDescriptor::new("auras", ColumnType::collection(' ', ScalarType::Integer))
                    .nullable(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_from_json() {
        let row = RowSnapshot::from_json_str(
            &schema(),
            r#"{"entry":1234,"path_id":"123","isLarge":5,"auras":null,"VerifiedBuild":0}"#,
        )
        .unwrap();
        assert_eq!(row.get("entry"), Some(&Value::Integer(1234)));
        assert_eq!(row.get("path_id"), Some(&Value::Integer(123)));
        assert_eq!(row.get("isLarge"), Some(&Value::Boolean(true)));
        assert_eq!(row.get("auras"), Some(&Value::Null));
        assert_eq!(row.get("VerifiedBuild"), None);
        assert_eq!(row.validate(&schema()), Ok(()));
    }

    #[test]
    fn test_collection_from_string_and_array() {
        let schema = schema();
        let auras = schema.column("auras").unwrap();
        assert_eq!(
            value_from_json(auras, &Json::String("1  2 3".into())).unwrap(),
            Value::from(vec![1i64, 2, 3])
        );
        assert_eq!(
            value_from_json(auras, &Json::String(String::new())).unwrap(),
            Value::List(vec![])
        );
        assert_eq!(
            value_from_json(auras, &serde_json::json!([4, 5])).unwrap(),
            Value::from(vec![4i64, 5])
        );
    }

    #[test]
    fn test_unsupported_values() {
        let schema = schema();
        let entry = schema.column("entry").unwrap();
        assert_eq!(
            value_from_json(entry, &serde_json::json!(1.5)),
            Err(Error::UnsupportedJson {
                column: "entry".into(),
                found: "number",
            })
        );
        assert_eq!(
            value_from_json(entry, &serde_json::json!({"a": 1})),
            Err(Error::UnsupportedJson {
                column: "entry".into(),
                found: "object",
            })
        );
    }

    #[test]
    fn test_malformed_document_keeps_the_parser_message() {
        let Err(Error::MalformedJson(message)) =
            RowSnapshot::from_json_str(&schema(), r#"{"entry": 1234,"#)
        else {
            panic!("truncated JSON must be reported as malformed");
        };
        assert!(message.contains("line 1"), "{message}");

        assert_eq!(
            RowSnapshot::from_json_str(&schema(), "[1, 2]"),
            Err(Error::UnsupportedJson {
                column: String::new(),
                found: "array",
            })
        );
    }

    #[test]
    fn test_missing_column() {
        assert_eq!(
            RowSnapshot::from_json_str(&schema(), r#"{"entry":1}"#),
            Err(Error::MissingColumn("path_id".into()))
        );
    }

    #[test]
    fn test_schema_round_trips_through_json() {
        let text = serde_json::to_string(&schema()).unwrap();
        let parsed: RowSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, schema());
    }

    #[test]
    fn test_invalid_schema_is_rejected_on_deserialize() {
        let text = r#"{"name":"t","columns":[{"name":"a","type":"integer"}]}"#;
        assert!(serde_json::from_str::<RowSchema>(text).is_err());
    }
}
