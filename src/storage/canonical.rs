//! Canonical status and priority text.
//!
//! Repositories always write `pending` / `in_progress` / `completed` and
//! `low` / `medium` / `high`, and every status filter compares against that
//! text. Rows that arrive another way (older snapshots, imported files, raw
//! SQL) may hold synonyms such as `done` or `urgent`; this pass rewrites them
//! in place so SQL filters and the domain read agree.

use rusqlite::Connection;
use tracing::{info, warn};

use super::ident::{Column, Table};
use super::query::{execute_query, execute_update, text, Statement};
use crate::error::Result;
use crate::validate::{normalize_priority, normalize_status};

const WORKFLOW_COLUMNS: [(Table, Column); 5] = [
    (Table::Deals, Column::Status),
    (Table::Deals, Column::Priority),
    (Table::Tasks, Column::Status),
    (Table::Tasks, Column::Priority),
    (Table::Notes, Column::Status),
];

/// Rewrite synonym status/priority text to its canonical value.
///
/// Text that resolves to nothing is left untouched and logged with the
/// closest known value, if any. Returns the number of rows rewritten. Does
/// not snapshot.
///
/// # Errors
///
/// Returns an error if a read or update fails.
pub fn canonicalize_workflow_text(conn: &Connection) -> Result<usize> {
    let mut rewritten = 0;

    for (table, column) in WORKFLOW_COLUMNS {
        let sql = format!("SELECT DISTINCT {column} FROM {table} WHERE {column} IS NOT NULL");
        let values: Vec<String> = execute_query(conn, &sql, &[], |row| row.get(0))?;

        for raw in values {
            let resolved = if column == Column::Status {
                normalize_status(&raw)
            } else {
                normalize_priority(&raw)
            };

            match resolved {
                Ok(canonical) if canonical != raw => {
                    let stmt = Statement::new(
                        format!("UPDATE {table} SET {column} = ? WHERE {column} = ?"),
                        vec![text(canonical), text(&raw)],
                    );
                    rewritten += execute_update(conn, &stmt)?;
                }
                Ok(_) => {}
                Err((_, suggestion)) => {
                    warn!(
                        table = %table,
                        column = %column,
                        value = %raw,
                        suggestion = suggestion.as_deref().unwrap_or("none"),
                        "Unrecognized value left as is"
                    );
                }
            }
        }
    }

    if rewritten > 0 {
        info!(rewritten, "Canonicalized status and priority text");
    }
    Ok(rewritten)
}
