//! Note queries and relations.

use chrono::{DateTime, Utc};

use super::{millis, Repository};
use crate::error::Result;
use crate::mapper::NoteRow;
use crate::model::{Note, WorkStatus};
use crate::storage::ident::{Column, Junction};
use crate::storage::query::{text, Condition, OrderBy};

pub type NoteRepository<'db> = Repository<'db, Note, NoteRow>;

const NEWEST_FIRST: Option<OrderBy> = Some(OrderBy::desc(Column::CreatedAt));

impl NoteRepository<'_> {
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_status(&self, status: WorkStatus) -> Result<Vec<Note>> {
        self.find_by(Column::Status, text(status.as_str()), NEWEST_FIRST)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_creator(&self, created_by: &str) -> Result<Vec<Note>> {
        self.find_by(Column::CreatedBy, text(created_by), NEWEST_FIRST)
    }

    /// Notes created within `[start, end]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_date_range(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<Vec<Note>> {
        self.find_where(
            &Condition::between(Column::CreatedAt, millis(start), millis(end)),
            NEWEST_FIRST,
            None,
        )
    }

    /// Substring match on title or content.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_by_content(&self, term: &str) -> Result<Vec<Note>> {
        self.find_where(
            &Condition::like_any(&[Column::Title, Column::Content], term),
            NEWEST_FIRST,
            None,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_recent(&self, limit: u32) -> Result<Vec<Note>> {
        self.find_where(&Condition::All, NEWEST_FIRST, Some(limit))
    }

    // ── Relations ────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_company(&self, note_id: &str, company_id: &str) -> Result<()> {
        self.link(Junction::NoteCompanies, note_id, company_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_company(&self, note_id: &str, company_id: &str) -> Result<bool> {
        self.unlink(Junction::NoteCompanies, note_id, company_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn company_ids(&self, note_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::NoteCompanies, note_id)
    }

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_deal(&self, note_id: &str, deal_id: &str) -> Result<()> {
        self.link(Junction::NoteDeals, note_id, deal_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_deal(&self, note_id: &str, deal_id: &str) -> Result<bool> {
        self.unlink(Junction::NoteDeals, note_id, deal_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn deal_ids(&self, note_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::NoteDeals, note_id)
    }

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn assign_contact(&self, note_id: &str, contact_id: &str) -> Result<()> {
        self.link(Junction::NoteAssignedContacts, note_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn unassign_contact(&self, note_id: &str, contact_id: &str) -> Result<bool> {
        self.unlink(Junction::NoteAssignedContacts, note_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn assigned_contact_ids(&self, note_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::NoteAssignedContacts, note_id)
    }

    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_with_relationships(&self, id: &str) -> Result<Option<Note>> {
        let Some(mut note) = self.get_by_id(id)? else {
            return Ok(None);
        };
        note.company_ids = self.company_ids(id)?;
        note.deal_ids = self.deal_ids(id)?;
        note.assigned_contact_ids = self.assigned_contact_ids(id)?;
        Ok(Some(note))
    }
}
