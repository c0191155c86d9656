#![doc = include_str!("../README.md")]
#![no_std]
#![deny(clippy::mod_module_files)]

extern crate alloc;

pub mod errors;
#[cfg(feature = "serde")]
pub mod json;
pub mod multi_row;
pub mod runner;
pub mod schema;
pub mod snapshot;
pub mod statements;
#[cfg(feature = "testing")]
pub mod testing;
pub mod tracker;
pub mod value;

// Re-export main types
pub use multi_row::RowSetTracker;
pub use runner::{ExecuteError, QueryRunner};
pub use schema::{ColumnDescriptor, ColumnType, RowSchema, ScalarType, TableDefinition};
pub use snapshot::RowSnapshot;
pub use tracker::{ColumnChange, DiffTracker, EditorMode};
pub use value::{Value, format_literal, quote_identifier};

// Re-export errors
pub use errors::Error;
