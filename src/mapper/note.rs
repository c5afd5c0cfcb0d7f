//! Note row and mapper.

use rusqlite::types::Value;
use rusqlite::Row;

use super::{from_millis, opt_date, opt_millis, opt_text, parse_status, text, to_millis, Mapper, TableRow};
use crate::model::{Note, WorkStatus};
use crate::storage::ident::{Column, Table};

/// Flat `notes` row. `status` is NOT NULL in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_by: String,
    pub status: String,
    pub logo: Option<String>,
    pub due_at: i64,
    pub completed_at: Option<i64>,
    pub completed_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TableRow for NoteRow {
    const TABLE: Table = Table::Notes;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<(Column, Value)> {
        vec![
            (Column::Id, text(&self.id)),
            (Column::Title, text(&self.title)),
            (Column::Content, text(&self.content)),
            (Column::CreatedBy, text(&self.created_by)),
            (Column::Status, text(&self.status)),
            (Column::Logo, opt_text(self.logo.as_ref())),
            (Column::DueAt, Value::Integer(self.due_at)),
            (Column::CompletedAt, self.completed_at.into()),
            (Column::CompletedBy, opt_text(self.completed_by.as_ref())),
            (Column::CreatedAt, Value::Integer(self.created_at)),
            (Column::UpdatedAt, Value::Integer(self.updated_at)),
        ]
    }

    fn from_sql_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            created_by: row.get("created_by")?,
            status: row.get("status")?,
            logo: row.get("logo")?,
            due_at: row.get("due_at")?,
            completed_at: row.get("completed_at")?,
            completed_by: row.get("completed_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn set_updated_at(&mut self, millis: i64) {
        self.updated_at = millis;
    }
}

#[must_use]
pub fn note_to_row(note: &Note) -> NoteRow {
    NoteRow {
        id: note.id.clone(),
        title: note.title.clone(),
        content: note.content.clone(),
        created_by: note.created_by.clone(),
        status: note.status.as_str().to_string(),
        logo: note.logo.clone(),
        due_at: to_millis(&note.due_at),
        completed_at: opt_millis(note.completed_at.as_ref()),
        completed_by: note.completed_by.clone(),
        created_at: to_millis(&note.created_at),
        updated_at: to_millis(&note.updated_at),
    }
}

/// Row to domain note; unreadable status falls back to pending.
#[must_use]
pub fn note_from_row(row: NoteRow) -> Note {
    Note {
        status: parse_status(&row.id, Some(&row.status)).unwrap_or_default(),
        due_at: from_millis(row.due_at),
        completed_at: opt_date(row.completed_at),
        created_at: from_millis(row.created_at),
        updated_at: from_millis(row.updated_at),
        company_ids: Vec::new(),
        deal_ids: Vec::new(),
        assigned_contact_ids: Vec::new(),
        id: row.id,
        title: row.title,
        content: row.content,
        created_by: row.created_by,
        logo: row.logo,
        completed_by: row.completed_by,
    }
}

pub const NOTE_MAPPER: Mapper<Note, NoteRow> = Mapper {
    to_row: note_to_row,
    from_row: note_from_row,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    #[test]
    fn test_round_trip() {
        let mut note = Note::new("Kickoff", "Notes from the call", "ann", now())
            .with_id("n1")
            .with_status(WorkStatus::InProgress);
        note.logo = Some("logo.png".to_string());

        assert_eq!(note_from_row(note_to_row(&note)), note);
    }

    #[test]
    fn test_unknown_status_falls_back_to_pending() {
        let mut row = note_to_row(&Note::new("x", "y", "z", now()));
        row.status = "archived-ish".to_string();
        assert_eq!(note_from_row(row).status, WorkStatus::Pending);
    }
}
