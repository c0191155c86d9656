//! Edit session fuzzer.
//!
//! Replays random sequences of edits, reverts and executions on a tracker
//! backed by an in-memory SQLite database, checking that:
//! 1. The dirty set is exactly the set of changed columns
//! 2. The partial update is empty if and only if nothing is dirty
//! 3. Every executed statement is accepted by SQLite
//! 4. The database ends up holding exactly the committed row

use honggfuzz::fuzz;
use sql_row_editor::testing::{EditScript, test_edit_session};

fn main() {
    loop {
        fuzz!(|script: EditScript| {
            test_edit_session(&script);
        });
    }
}
