//! Row types and domain/row conversion.
//!
//! Every entity has a flat row struct mirroring its table (integers for
//! timestamps, JSON text for structured fields) and a pair of pure
//! conversion functions bundled in a [`Mapper`]. The generic repository is
//! parameterized by that mapper instead of being subclassed.
//!
//! Structured fields that fail to parse are logged and read as absent. An
//! empty social-links map is stored as NULL, so "never set" and "emptied"
//! read back the same way.

pub mod company;
pub mod contact;
pub mod deal;
pub mod note;
pub mod task;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::model::{Priority, WorkStatus};
use crate::storage::ident::{Column, Table};
use crate::validate::{normalize_priority, normalize_status};

pub use company::{CompanyRow, COMPANY_MAPPER};
pub use contact::{ContactRow, CONTACT_MAPPER};
pub use deal::{DealRow, DEAL_MAPPER};
pub use note::{NoteRow, NOTE_MAPPER};
pub use task::{TaskRow, TASK_MAPPER};

/// A flat row of one entity table.
pub trait TableRow: Sized {
    /// Table the row lives in.
    const TABLE: Table;

    /// Primary key.
    fn id(&self) -> &str;

    /// Column/value pairs in table order, `id` first.
    fn fields(&self) -> Vec<(Column, Value)>;

    /// Read a `SELECT *` row by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or has an incompatible type.
    fn from_sql_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Overwrite the `updated_at` column.
    fn set_updated_at(&mut self, millis: i64);
}

/// Conversion strategy between a domain type `D` and its row type `R`.
pub struct Mapper<D, R> {
    pub to_row: fn(&D) -> R,
    pub from_row: fn(R) -> D,
}

impl<D, R> Clone for Mapper<D, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, R> Copy for Mapper<D, R> {}

impl<D, R> std::fmt::Debug for Mapper<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper").finish_non_exhaustive()
    }
}

// ── Field helpers ────────────────────────────────────────────

/// Domain date to row milliseconds.
#[must_use]
pub fn to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Row milliseconds to domain date; out-of-range values clamp to the epoch.
#[must_use]
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

pub(crate) fn opt_millis(dt: Option<&DateTime<Utc>>) -> Option<i64> {
    dt.map(to_millis)
}

pub(crate) fn opt_date(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.map(from_millis)
}

/// Serialize a structured field to JSON text.
pub(crate) fn to_json<T: Serialize>(value: Option<&T>) -> Option<String> {
    value.and_then(|v| serde_json::to_string(v).ok())
}

/// Parse a JSON text column, logging and dropping it on failure.
pub(crate) fn parse_json<T: DeserializeOwned>(column: Column, id: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(column = %column, id, error = %e, "Failed to parse JSON column, treating as absent");
            None
        }
    }
}

/// Parse a stored status, logging text that does not resolve along with the
/// closest valid spelling.
pub(crate) fn parse_status(id: &str, raw: Option<&str>) -> Option<WorkStatus> {
    match normalize_status(raw?) {
        Ok(canonical) => WorkStatus::parse(canonical),
        Err((value, suggestion)) => {
            warn!(
                id,
                value = %value,
                suggestion = suggestion.as_deref().unwrap_or("none"),
                "Unrecognized status, treating as absent"
            );
            None
        }
    }
}

/// Parse a stored priority; see [`parse_status`].
pub(crate) fn parse_priority(id: &str, raw: Option<&str>) -> Option<Priority> {
    match normalize_priority(raw?) {
        Ok(canonical) => Priority::parse(canonical),
        Err((value, suggestion)) => {
            warn!(
                id,
                value = %value,
                suggestion = suggestion.as_deref().unwrap_or("none"),
                "Unrecognized priority, treating as absent"
            );
            None
        }
    }
}

pub(crate) fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub(crate) fn opt_text(s: Option<&String>) -> Value {
    s.cloned().into()
}
