//! Deal queries, relations and aggregates.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{millis, Repository};
use crate::error::Result;
use crate::mapper::DealRow;
use crate::model::{Deal, Priority, WorkStatus};
use crate::storage::ident::{Column, Junction};
use crate::storage::query::{text, Condition, OrderBy};

pub type DealRepository<'db> = Repository<'db, Deal, DealRow>;

const BY_DUE: Option<OrderBy> = Some(OrderBy::asc(Column::DueAt));

/// Deal counts by status plus the sum of all amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealStatistics {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub total_value: f64,
}

fn status_is(status: WorkStatus) -> Condition {
    Condition::eq(Column::Status, text(status.as_str()))
}

/// Due before now and not completed. A deal without a status counts.
fn overdue() -> Condition {
    Condition::lt(Column::DueAt, Utc::now().timestamp_millis())
        .and(Condition::not_eq(Column::Status, text(WorkStatus::Completed.as_str())))
}

impl DealRepository<'_> {
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_status(&self, status: WorkStatus) -> Result<Vec<Deal>> {
        self.find_where(&status_is(status), BY_DUE, None)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_priority(&self, priority: Priority) -> Result<Vec<Deal>> {
        self.find_by(Column::Priority, text(priority.as_str()), BY_DUE)
    }

    /// Deals past their due date that are not completed, soonest due first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_overdue(&self) -> Result<Vec<Deal>> {
        self.find_where(&overdue(), BY_DUE, None)
    }

    /// Deals due within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_due_date_range(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<Vec<Deal>> {
        self.find_where(
            &Condition::between(Column::DueAt, millis(start), millis(end)),
            BY_DUE,
            None,
        )
    }

    // ── Relations ────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_company(&self, deal_id: &str, company_id: &str) -> Result<()> {
        self.link(Junction::DealCompanies, deal_id, company_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_company(&self, deal_id: &str, company_id: &str) -> Result<bool> {
        self.unlink(Junction::DealCompanies, deal_id, company_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn company_ids(&self, deal_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::DealCompanies, deal_id)
    }

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_contact(&self, deal_id: &str, contact_id: &str) -> Result<()> {
        self.link(Junction::DealContacts, deal_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_contact(&self, deal_id: &str, contact_id: &str) -> Result<bool> {
        self.unlink(Junction::DealContacts, deal_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn contact_ids(&self, deal_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::DealContacts, deal_id)
    }

    /// Link in one direction only; the related deal does not see this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_related_deal(&self, deal_id: &str, related_id: &str) -> Result<()> {
        self.link(Junction::DealRelatedDeals, deal_id, related_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_related_deal(&self, deal_id: &str, related_id: &str) -> Result<bool> {
        self.unlink(Junction::DealRelatedDeals, deal_id, related_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn related_deal_ids(&self, deal_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::DealRelatedDeals, deal_id)
    }

    /// Deal with company, contact and related-deal ids filled in.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_with_relationships(&self, id: &str) -> Result<Option<Deal>> {
        let Some(mut deal) = self.get_by_id(id)? else {
            return Ok(None);
        };
        deal.company_ids = self.company_ids(id)?;
        deal.contact_ids = self.contact_ids(id)?;
        deal.related_deal_ids = self.related_deal_ids(id)?;
        Ok(Some(deal))
    }

    // ── Aggregates ───────────────────────────────────────────

    /// Sum of `amount` over deals in `status`; `0.0` when there are none.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_total_value_by_status(&self, status: WorkStatus) -> Result<f64> {
        self.sum(Column::Amount, &status_is(status))
    }

    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_statistics(&self) -> Result<DealStatistics> {
        Ok(DealStatistics {
            total: self.count(&Condition::All)?,
            pending: self.count(&status_is(WorkStatus::Pending))?,
            in_progress: self.count(&status_is(WorkStatus::InProgress))?,
            completed: self.count(&status_is(WorkStatus::Completed))?,
            total_value: self.sum(Column::Amount, &Condition::All)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;
    use crate::storage::SqliteStorage;
    use chrono::Duration;

    fn deal(id: &str, due_in_days: i64, status: WorkStatus) -> Deal {
        Deal::new(id, "", "sam", now() + Duration::days(due_in_days))
            .with_id(id)
            .with_status(status)
    }

    #[test]
    fn test_delete_then_get_is_none() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.deals();
        repo.create(&deal("d1", 1, WorkStatus::Pending)).unwrap();

        assert!(repo.delete("d1").unwrap());
        assert!(repo.get_by_id("d1").unwrap().is_none());
        assert_eq!(repo.get_statistics().unwrap().total, 0);
    }

    #[test]
    fn test_overdue_excludes_completed() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.deals();
        repo.create(&deal("late", -2, WorkStatus::Pending)).unwrap();
        repo.create(&deal("later", -1, WorkStatus::InProgress)).unwrap();
        repo.create(&deal("done", -3, WorkStatus::Completed)).unwrap();
        repo.create(&deal("future", 5, WorkStatus::Pending)).unwrap();

        let ids: Vec<String> = repo.find_overdue().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["late", "later"]);
    }

    #[test]
    fn test_status_priority_and_range() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.deals();
        repo.create(&deal("b", 2, WorkStatus::Pending).with_priority(Priority::High)).unwrap();
        repo.create(&deal("a", 1, WorkStatus::Pending)).unwrap();
        repo.create(&deal("c", 10, WorkStatus::Completed)).unwrap();

        let pending: Vec<String> = repo.find_by_status(WorkStatus::Pending).unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(pending, vec!["a", "b"]);
        assert_eq!(repo.find_by_priority(Priority::High).unwrap().len(), 1);

        let week = repo.find_by_due_date_range(&now(), &(now() + Duration::days(7))).unwrap();
        assert_eq!(week.len(), 2);
    }

    #[test]
    fn test_statistics() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.deals();
        repo.create(&deal("a", 1, WorkStatus::Pending).with_amount(100.0, "USD")).unwrap();
        repo.create(&deal("b", 1, WorkStatus::Completed).with_amount(250.0, "USD")).unwrap();
        repo.create(&deal("c", 1, WorkStatus::InProgress)).unwrap();

        let stats = repo.get_statistics().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 1);
        assert!((stats.total_value - 350.0).abs() < f64::EPSILON);

        let completed = repo.get_total_value_by_status(WorkStatus::Completed).unwrap();
        assert!((completed - 250.0).abs() < f64::EPSILON);
        let in_progress = repo.get_total_value_by_status(WorkStatus::InProgress).unwrap();
        assert!(in_progress.abs() < f64::EPSILON);
    }

    #[test]
    fn test_relationships() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.deals();
        repo.create(&deal("d1", 1, WorkStatus::Pending)).unwrap();

        repo.add_company("d1", "co1").unwrap();
        repo.add_contact("d1", "c1").unwrap();
        repo.add_contact("d1", "c2").unwrap();
        repo.add_related_deal("d1", "d2").unwrap();

        let loaded = repo.get_with_relationships("d1").unwrap().unwrap();
        assert_eq!(loaded.company_ids, vec!["co1"]);
        assert_eq!(loaded.contact_ids, vec!["c1", "c2"]);
        assert_eq!(loaded.related_deal_ids, vec!["d2"]);
        assert!(repo.related_deal_ids("d2").unwrap().is_empty());

        assert!(repo.remove_contact("d1", "c1").unwrap());
        assert!(repo.remove_company("d1", "co1").unwrap());
        assert!(repo.remove_related_deal("d1", "d2").unwrap());
        assert_eq!(repo.contact_ids("d1").unwrap(), vec!["c2"]);
    }
}
