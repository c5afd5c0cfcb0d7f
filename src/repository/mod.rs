//! Repositories over the entity tables.
//!
//! [`Repository`] implements CRUD once, parameterized by a [`Mapper`] that
//! converts between the domain type and its flat row. Entity-specific
//! queries are inherent methods on the concrete instantiations in the
//! submodules.
//!
//! Every mutating call snapshots the whole database afterwards. There is no
//! batching across calls: creating an entity and attaching three relations
//! is four independent saves.

pub mod company;
pub mod contact;
pub mod deal;
pub mod lookup;
pub mod note;
pub mod task;

use rusqlite::types::Value;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::mapper::{Mapper, TableRow};
use crate::storage::ident::{Column, Junction};
use crate::storage::query::{
    self, build_insert, build_update, execute_delete, execute_insert, execute_query,
    execute_update, text, Condition, OrderBy, Page, Statement,
};
use crate::storage::SqliteStorage;

pub use company::CompanyRepository;
pub use contact::ContactRepository;
pub use deal::{DealRepository, DealStatistics};
pub use lookup::LookupRepository;
pub use note::NoteRepository;
pub use task::{TaskRepository, TaskStatistics};

/// CRUD over one entity table.
pub struct Repository<'db, D, R> {
    db: &'db SqliteStorage,
    mapper: Mapper<D, R>,
}

impl<D, R> std::fmt::Debug for Repository<'_, D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

impl<'db, D, R: TableRow> Repository<'db, D, R> {
    #[must_use]
    pub const fn new(db: &'db SqliteStorage, mapper: Mapper<D, R>) -> Self {
        Self { db, mapper }
    }

    /// The handle this repository reads and writes through.
    #[must_use]
    pub const fn storage(&self) -> &'db SqliteStorage {
        self.db
    }

    fn read(&self, row: R) -> D {
        (self.mapper.from_row)(row)
    }

    /// Insert an entity, save, and return it as read back from the table.
    ///
    /// # Errors
    ///
    /// Returns the insert or save error (a duplicate id is a constraint
    /// error), or `NotReadBack` if the row cannot be found afterwards.
    pub fn create(&self, entity: &D) -> Result<D> {
        let row = (self.mapper.to_row)(entity);
        let id = row.id().to_string();

        let stmt = build_insert(R::TABLE, row.fields())?;
        if let Err(e) = execute_insert(self.db.conn(), &stmt) {
            error!(table = %R::TABLE, id = %id, error = %e, "Failed to create entity");
            return Err(e);
        }
        self.db.save()?;

        self.get_by_id(&id)?.ok_or(Error::NotReadBack {
            table: R::TABLE.as_str(),
            id,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the query fails; a missing id is `Ok(None)`.
    pub fn get_by_id(&self, id: &str) -> Result<Option<D>> {
        let row = query::select_by_id(self.db.conn(), R::TABLE, id, R::from_sql_row)?;
        Ok(row.map(|r| self.read(r)))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_all(&self, order: Option<OrderBy>) -> Result<Vec<D>> {
        let rows = query::select_all(self.db.conn(), R::TABLE, order, R::from_sql_row)?;
        Ok(rows.into_iter().map(|r| self.read(r)).collect())
    }

    /// Merge changes into a stored entity and write it back.
    ///
    /// `merge` runs on the current domain value. `id` and `created_at` are
    /// never rewritten and `updated_at` is set to now regardless of what
    /// `merge` did. Returns `None` when no entity has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the update or save fails.
    pub fn update<F>(&self, id: &str, merge: F) -> Result<Option<D>>
    where
        F: FnOnce(&mut D),
    {
        let Some(mut entity) = self.get_by_id(id)? else {
            debug!(table = %R::TABLE, id, "Update of missing entity");
            return Ok(None);
        };
        merge(&mut entity);

        let mut row = (self.mapper.to_row)(&entity);
        row.set_updated_at(chrono::Utc::now().timestamp_millis());

        let stmt = build_update(R::TABLE, id, row.fields())?;
        execute_update(self.db.conn(), &stmt)?;
        self.db.save()?;

        self.get_by_id(id)
    }

    /// Delete by id. Saves, and returns `true`, only if a row was removed.
    ///
    /// Junction rows pointing at the entity are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let stmt = Statement::new(format!("DELETE FROM {} WHERE id = ?", R::TABLE), vec![text(id)]);
        let removed = execute_delete(self.db.conn(), &stmt)? > 0;
        if removed {
            self.db.save()?;
        }
        Ok(removed)
    }

    /// Entities whose `column` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by(&self, column: Column, value: impl Into<Value>, order: Option<OrderBy>) -> Result<Vec<D>> {
        self.find_where(&Condition::eq(column, value), order, None)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_where(&self, condition: &Condition, order: Option<OrderBy>, limit: Option<u32>) -> Result<Vec<D>> {
        let rows = query::select_where(self.db.conn(), R::TABLE, condition, order, limit, R::from_sql_row)?;
        Ok(rows.into_iter().map(|r| self.read(r)).collect())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, condition: &Condition) -> Result<u64> {
        query::count(self.db.conn(), R::TABLE, condition)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn exists(&self, id: &str) -> Result<bool> {
        query::exists(self.db.conn(), R::TABLE, id)
    }

    /// Sum of a numeric column; `0.0` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn sum(&self, column: Column, condition: &Condition) -> Result<f64> {
        query::sum(self.db.conn(), R::TABLE, column, condition)
    }

    /// One page of entities (1-based). `None` uses the default page size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero page size, or a query error.
    pub fn paginate(&self, page: u32, page_size: Option<u32>, order: Option<OrderBy>, condition: &Condition) -> Result<Page<D>> {
        let rows = query::paginate(
            self.db.conn(),
            R::TABLE,
            page,
            page_size,
            order,
            condition,
            R::from_sql_row,
        )?;
        Ok(Page {
            data: rows.data.into_iter().map(|r| self.read(r)).collect(),
            total: rows.total,
            page: rows.page,
            page_size: rows.page_size,
            total_pages: rows.total_pages,
        })
    }

    // ── Junctions ────────────────────────────────────────────

    /// Link `owner_id` to `other_id`. Linking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn link(&self, junction: Junction, owner_id: &str, other_id: &str) -> Result<()> {
        let stmt = Statement::new(
            format!(
                "INSERT OR IGNORE INTO {junction} ({}, {}) VALUES (?, ?)",
                junction.owner_column(),
                junction.other_column()
            ),
            vec![text(owner_id), text(other_id)],
        );
        execute_insert(self.db.conn(), &stmt)?;
        self.db.save()
    }

    /// Remove a link. Returns `false` when there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn unlink(&self, junction: Junction, owner_id: &str, other_id: &str) -> Result<bool> {
        let stmt = Statement::new(
            format!(
                "DELETE FROM {junction} WHERE {} = ? AND {} = ?",
                junction.owner_column(),
                junction.other_column()
            ),
            vec![text(owner_id), text(other_id)],
        );
        let removed = execute_delete(self.db.conn(), &stmt)? > 0;
        if removed {
            self.db.save()?;
        }
        Ok(removed)
    }

    /// Ids linked to `owner_id`, in link order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn linked_ids(&self, junction: Junction, owner_id: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {junction} WHERE {} = ? ORDER BY rowid",
            junction.other_column(),
            junction.owner_column()
        );
        execute_query(self.db.conn(), &sql, &[text(owner_id)], |row| row.get(0))
    }

    /// Owner ids linked to `other_id`, in link order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn owners_of(&self, junction: Junction, other_id: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {} FROM {junction} WHERE {} = ? ORDER BY rowid",
            junction.owner_column(),
            junction.other_column()
        );
        execute_query(self.db.conn(), &sql, &[text(other_id)], |row| row.get(0))
    }
}

/// Start of the current UTC day, in row milliseconds.
pub(crate) fn start_of_today() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
        .date_naive()
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}

pub(crate) fn millis(dt: &chrono::DateTime<chrono::Utc>) -> i64 {
    dt.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use crate::model::{Contact, SocialLinks};
    use crate::storage::ident::{Column, Junction};
    use crate::storage::query::{Condition, OrderBy};
    use crate::storage::SqliteStorage;
    use crate::Error;

    #[test]
    fn test_create_and_get() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.contacts();

        let created = repo.create(&Contact::new("Ann").with_id("c1").with_email("ann@example.com")).unwrap();
        assert_eq!(created.id, "c1");
        assert_eq!(repo.get_by_id("c1").unwrap(), Some(created));
        assert!(repo.get_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_an_error() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.contacts();
        repo.create(&Contact::new("Ann").with_id("c1")).unwrap();

        let err = repo.create(&Contact::new("Other Ann").with_id("c1")).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(repo.get_by_id("c1").unwrap().map(|c| c.name), Some("Ann".to_string()));
    }

    #[test]
    fn test_update_merges_and_protects_immutable_fields() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.contacts();
        let mut ann = Contact::new("Ann").with_id("c1");
        ann.created_at = ann.created_at - chrono::Duration::days(1);
        ann.updated_at = ann.created_at;
        let created = repo.create(&ann).unwrap();

        let updated = repo
            .update("c1", |c| {
                c.phone = Some("555".to_string());
                c.id = "hijacked".to_string();
                c.created_at = crate::mapper::from_millis(0);
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, "c1");
        assert_eq!(updated.name, "Ann");
        assert_eq!(updated.phone.as_deref(), Some("555"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert!(updated.updated_at > ann.updated_at + chrono::Duration::hours(23));
        assert!(repo.get_by_id("hijacked").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_is_none() {
        let db = SqliteStorage::open_memory().unwrap();
        assert!(db.contacts().update("nope", |c| c.name.clear()).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.contacts();
        repo.create(&Contact::new("Ann").with_id("c1")).unwrap();

        assert!(repo.delete("c1").unwrap());
        assert!(!repo.delete("c1").unwrap());
        assert!(!repo.exists("c1").unwrap());
    }

    #[test]
    fn test_empty_social_links_read_back_absent() {
        let db = SqliteStorage::open_memory().unwrap();
        let mut contact = Contact::new("Ann").with_id("c1");
        contact.social_links = Some(SocialLinks::new());

        let created = db.contacts().create(&contact).unwrap();
        assert_eq!(created.social_links, None);
    }

    #[test]
    fn test_find_count_paginate() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.contacts();
        for (id, name, country) in [("a", "Ann", "US"), ("b", "Bob", "DE"), ("c", "Cid", "US")] {
            repo.create(&Contact::new(name).with_id(id).with_country(country)).unwrap();
        }

        let us = repo.find_by(Column::Country, "US".to_string(), Some(OrderBy::desc(Column::Name))).unwrap();
        assert_eq!(us.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["c", "a"]);
        assert_eq!(repo.count(&Condition::eq(Column::Country, "US".to_string())).unwrap(), 2);

        let page = repo.paginate(2, Some(2), Some(OrderBy::asc(Column::Name)), &Condition::All).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Cid");

        let all = repo.paginate(1, None, None, &Condition::All).unwrap();
        assert_eq!(all.page_size, crate::config::DEFAULT_PAGE_SIZE);
        assert_eq!(all.data.len(), 3);
    }

    #[test]
    fn test_links_are_idempotent_and_ordered() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.companies();

        repo.link(Junction::CompanyContacts, "co1", "c2").unwrap();
        repo.link(Junction::CompanyContacts, "co1", "c1").unwrap();
        repo.link(Junction::CompanyContacts, "co1", "c2").unwrap();

        assert_eq!(repo.linked_ids(Junction::CompanyContacts, "co1").unwrap(), vec!["c2", "c1"]);
        assert_eq!(repo.owners_of(Junction::CompanyContacts, "c1").unwrap(), vec!["co1"]);

        assert!(repo.unlink(Junction::CompanyContacts, "co1", "c2").unwrap());
        assert!(!repo.unlink(Junction::CompanyContacts, "co1", "c2").unwrap());
    }
}
