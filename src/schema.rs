//! Table schema types: column descriptors, the schema trait and its
//! runtime implementation.
mod column;
mod row_schema;
mod table;

pub use column::{ColumnDescriptor, ColumnType, ScalarType};
pub use row_schema::RowSchema;
pub use table::TableDefinition;
