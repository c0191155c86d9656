//! Submodule defining the errors used across the crate.

use alloc::string::String;

use crate::schema::ColumnType;

/// Errors raised while building schemas, tracking edits or rendering SQL.
///
/// Every variant describes a configuration or programming error in the host:
/// the same call with the same inputs fails the same way, so none of them is
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Two columns of the same schema share a name.
    #[error("Column `{0}` is declared more than once")]
    DuplicateColumn(String),
    /// The schema does not mark any column as part of the primary key.
    #[error("Table `{0}` has no primary key column")]
    MissingPrimaryKey(String),
    /// A primary key column was declared nullable.
    #[error("Primary key column `{0}` cannot be nullable")]
    NullablePrimaryKey(String),
    /// A column name that is not part of the schema.
    #[error("Unknown column `{0}`")]
    UnknownColumn(String),
    /// A snapshot does not provide a value for a schema column.
    #[error("Row has no value for column `{0}`")]
    MissingColumn(String),
    /// The runtime shape of a value does not match the declared column type.
    #[error("Column `{column}` expects {expected}, found {found}")]
    TypeMismatch {
        /// The column the value was meant for.
        column: String,
        /// The declared type of the column.
        expected: ColumnType,
        /// The kind of value that was provided.
        found: &'static str,
    },
    /// `NULL` was provided for a column that is not nullable.
    #[error("Column `{0}` is not nullable")]
    NullNotAllowed(String),
    /// A float that SQL cannot represent (NaN or infinity).
    #[error("Column `{0}` received a non-finite float")]
    NonFiniteFloat(String),
    /// A collection element contains the delimiter used to join elements.
    #[error("An element of column `{column}` contains the delimiter {delimiter:?}")]
    DelimiterInElement {
        /// The collection column.
        column: String,
        /// The delimiter configured for the column.
        delimiter: char,
    },
    /// A numeric collection delimited by a character its elements can contain.
    #[error("Column `{column}` cannot delimit numbers with {delimiter:?}")]
    NumericDelimiter {
        /// The collection column.
        column: String,
        /// The delimiter configured for the column.
        delimiter: char,
    },
    /// A group or row key column of a multi-row session accepts `NULL`.
    #[error("Key column `{0}` of a row group cannot be nullable")]
    NullableKeyColumn(String),
    /// Synthesis or editing was requested before a row was loaded.
    #[error("No row has been loaded into the editing session")]
    NotLoaded,
    /// Two rows of a multi-row session share the same row key.
    #[error("Row key {0} appears more than once")]
    DuplicateRowKey(String),
    /// A row key that does not belong to the multi-row session.
    #[error("No row with key {0}")]
    UnknownRowKey(String),
    /// A row whose group column differs from the loaded group.
    #[error("Row belongs to group {found}, expected {expected}")]
    GroupMismatch {
        /// The group value of the session, rendered as a SQL literal.
        expected: String,
        /// The group value found on the row, rendered as a SQL literal.
        found: String,
    },
    /// An attempt to edit a column that identifies rows in a multi-row session.
    #[error("Key column `{0}` cannot be edited in place")]
    KeyColumnEdit(String),
    /// A JSON value that cannot be converted to the column type.
    #[cfg(feature = "serde")]
    #[error("Column `{column}` cannot be read from JSON {found}")]
    UnsupportedJson {
        /// The column being converted.
        column: String,
        /// The JSON kind that was found.
        found: &'static str,
    },
    /// The text handed to the JSON adapter is not valid JSON.
    #[cfg(feature = "serde")]
    #[error("Malformed JSON row: {0}")]
    MalformedJson(String),
}
