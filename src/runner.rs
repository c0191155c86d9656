//! Hand-off of synthesized statements to an external query runner.
//!
//! The crate never talks to a database. A host implements [`QueryRunner`]
//! over whatever transport it has (an HTTP gateway, a MySQL client, an
//! in-memory SQLite for tests) and the trackers pass it their canonical
//! statement as opaque text.

use crate::errors::Error;
use crate::multi_row::RowSetTracker;
use crate::schema::TableDefinition;
use crate::tracker::DiffTracker;

/// Something able to execute SQL text.
pub trait QueryRunner {
    /// The error reported when execution fails.
    type Error;

    /// Execute `sql`, which may hold several `;`-terminated statements.
    ///
    /// # Errors
    ///
    /// Whatever the runner reports; the trackers forward it untouched.
    fn query(&mut self, sql: &str) -> Result<(), Self::Error>;
}

impl<R: QueryRunner + ?Sized> QueryRunner for &mut R {
    type Error = R::Error;

    #[inline]
    fn query(&mut self, sql: &str) -> Result<(), Self::Error> {
        R::query(self, sql)
    }
}

/// Failure of an `execute` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError<E> {
    /// The statement could not be synthesized.
    #[error(transparent)]
    Synthesis(#[from] Error),
    /// The runner rejected the statement; the session is left unchanged.
    #[error("Query runner failed: {0}")]
    Runner(E),
}

impl<T: TableDefinition> DiffTracker<T> {
    /// Execute the canonical statement and, on success, commit the baseline.
    ///
    /// Returns `false` without calling the runner when the canonical
    /// statement is an empty update.
    ///
    /// # Errors
    ///
    /// * `Synthesis` - The session is not loaded.
    /// * `Runner` - The runner failed; nothing is committed.
    pub fn execute<R: QueryRunner>(&mut self, runner: &mut R) -> Result<bool, ExecuteError<R::Error>> {
        let sql = self.canonical_statement()?;
        if sql.is_empty() {
            return Ok(false);
        }
        runner.query(&sql).map_err(ExecuteError::Runner)?;
        tracing::debug!(table = self.schema().table_name(), "executed statement");
        self.commit()?;
        Ok(true)
    }
}

impl<T: TableDefinition> RowSetTracker<T> {
    /// Execute the diff statement and, on success, commit the baseline.
    ///
    /// Returns `false` without calling the runner when nothing changed.
    ///
    /// # Errors
    ///
    /// * `Synthesis` - The session is not loaded.
    /// * `Runner` - The runner failed; nothing is committed.
    pub fn execute<R: QueryRunner>(&mut self, runner: &mut R) -> Result<bool, ExecuteError<R::Error>> {
        let sql = self.diff_statement()?;
        if sql.is_empty() {
            return Ok(false);
        }
        runner.query(&sql).map_err(ExecuteError::Runner)?;
        tracing::debug!(table = self.schema().table_name(), "executed row group statement");
        self.commit()?;
        Ok(true)
    }
}
