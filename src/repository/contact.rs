//! Contact queries.

use chrono::{DateTime, Duration, Utc};

use super::{millis, start_of_today, Repository};
use crate::error::Result;
use crate::mapper::ContactRow;
use crate::model::Contact;
use crate::storage::ident::{Column, Junction};
use crate::storage::query::{text, Condition, OrderBy};

pub type ContactRepository<'db> = Repository<'db, Contact, ContactRow>;

const BY_NAME: Option<OrderBy> = Some(OrderBy::asc(Column::Name));
const NEWEST_FIRST: Option<OrderBy> = Some(OrderBy::desc(Column::CreatedAt));

impl ContactRepository<'_> {
    /// First contact with this email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_email(&self, email: &str) -> Result<Option<Contact>> {
        Ok(self
            .find_where(&Condition::eq(Column::Email, text(email)), None, Some(1))?
            .into_iter()
            .next())
    }

    /// Contacts whose `company_id` column points at `company_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_company_id(&self, company_id: &str) -> Result<Vec<Contact>> {
        self.find_by(Column::CompanyId, text(company_id), BY_NAME)
    }

    /// Case-insensitive substring match on name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_by_name(&self, term: &str) -> Result<Vec<Contact>> {
        self.find_where(&Condition::like_any(&[Column::Name], term), BY_NAME, None)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_country(&self, country: &str) -> Result<Vec<Contact>> {
        self.find_by(Column::Country, text(country), BY_NAME)
    }

    /// Most recently created contacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_recent(&self, limit: u32) -> Result<Vec<Contact>> {
        self.find_where(&Condition::All, NEWEST_FIRST, Some(limit))
    }

    /// Contacts created within `[start, end]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_date_range(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<Vec<Contact>> {
        self.find_where(
            &Condition::between(Column::CreatedAt, millis(start), millis(end)),
            NEWEST_FIRST,
            None,
        )
    }

    /// Contacts created since the start of today (UTC).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_leads(&self) -> Result<Vec<Contact>> {
        self.find_by_date_range(&start_of_today(), &Utc::now())
    }

    /// Contacts created during the last seven days.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_follow_ups(&self) -> Result<Vec<Contact>> {
        self.find_by_date_range(&(start_of_today() - Duration::days(7)), &Utc::now())
    }

    /// Contacts not touched for more than a week, most recently touched first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_pipeline(&self) -> Result<Vec<Contact>> {
        let cutoff = start_of_today() - Duration::days(7);
        self.find_where(
            &Condition::lt(Column::UpdatedAt, millis(&cutoff)),
            Some(OrderBy::desc(Column::UpdatedAt)),
            None,
        )
    }

    /// Companies that list this contact through `company_contacts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn company_ids(&self, contact_id: &str) -> Result<Vec<String>> {
        self.owners_of(Junction::CompanyContacts, contact_id)
    }
}
