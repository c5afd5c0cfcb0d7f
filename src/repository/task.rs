//! Task queries and relations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{millis, Repository};
use crate::error::Result;
use crate::mapper::TaskRow;
use crate::model::{Priority, Task, WorkStatus};
use crate::storage::ident::{Column, Junction};
use crate::storage::query::{text, Condition, OrderBy};

pub type TaskRepository<'db> = Repository<'db, Task, TaskRow>;

const BY_DUE: Option<OrderBy> = Some(OrderBy::asc(Column::DueAt));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatistics {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub overdue: u64,
}

fn status_is(status: WorkStatus) -> Condition {
    Condition::eq(Column::Status, text(status.as_str()))
}

fn overdue() -> Condition {
    Condition::lt(Column::DueAt, Utc::now().timestamp_millis())
        .and(Condition::not_eq(Column::Status, text(WorkStatus::Completed.as_str())))
}

impl TaskRepository<'_> {
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_status(&self, status: WorkStatus) -> Result<Vec<Task>> {
        self.find_where(&status_is(status), BY_DUE, None)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_priority(&self, priority: Priority) -> Result<Vec<Task>> {
        self.find_by(Column::Priority, text(priority.as_str()), BY_DUE)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_creator(&self, created_by: &str) -> Result<Vec<Task>> {
        self.find_by(Column::CreatedBy, text(created_by), BY_DUE)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_overdue(&self) -> Result<Vec<Task>> {
        self.find_where(&overdue(), BY_DUE, None)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn find_by_due_date_range(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<Vec<Task>> {
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
    pub fn add_company(&self, task_id: &str, company_id: &str) -> Result<()> {
        self.link(Junction::TaskCompanies, task_id, company_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_company(&self, task_id: &str, company_id: &str) -> Result<bool> {
        self.unlink(Junction::TaskCompanies, task_id, company_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn company_ids(&self, task_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::TaskCompanies, task_id)
    }

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_contact(&self, task_id: &str, contact_id: &str) -> Result<()> {
        self.link(Junction::TaskContacts, task_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_contact(&self, task_id: &str, contact_id: &str) -> Result<bool> {
        self.unlink(Junction::TaskContacts, task_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn contact_ids(&self, task_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::TaskContacts, task_id)
    }

    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn add_deal(&self, task_id: &str, deal_id: &str) -> Result<()> {
        self.link(Junction::TaskDeals, task_id, deal_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn remove_deal(&self, task_id: &str, deal_id: &str) -> Result<bool> {
        self.unlink(Junction::TaskDeals, task_id, deal_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn deal_ids(&self, task_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::TaskDeals, task_id)
    }

    /// Assignment is a separate relation from "task is about this contact".
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or save fails.
    pub fn assign_contact(&self, task_id: &str, contact_id: &str) -> Result<()> {
        self.link(Junction::TaskAssignedContacts, task_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the delete or save fails.
    pub fn unassign_contact(&self, task_id: &str, contact_id: &str) -> Result<bool> {
        self.unlink(Junction::TaskAssignedContacts, task_id, contact_id)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn assigned_contact_ids(&self, task_id: &str) -> Result<Vec<String>> {
        self.linked_ids(Junction::TaskAssignedContacts, task_id)
    }

    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_with_relationships(&self, id: &str) -> Result<Option<Task>> {
        let Some(mut task) = self.get_by_id(id)? else {
            return Ok(None);
        };
        task.company_ids = self.company_ids(id)?;
        task.contact_ids = self.contact_ids(id)?;
        task.deal_ids = self.deal_ids(id)?;
        task.assigned_contact_ids = self.assigned_contact_ids(id)?;
        Ok(Some(task))
    }

    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn get_statistics(&self) -> Result<TaskStatistics> {
        Ok(TaskStatistics {
            total: self.count(&Condition::All)?,
            pending: self.count(&status_is(WorkStatus::Pending))?,
            in_progress: self.count(&status_is(WorkStatus::InProgress))?,
            completed: self.count(&status_is(WorkStatus::Completed))?,
            overdue: self.count(&overdue())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;
    use crate::storage::SqliteStorage;
    use chrono::Duration;

    fn task(id: &str, creator: &str, due_in_days: i64, status: WorkStatus) -> Task {
        Task::new(id, "", creator, now() + Duration::days(due_in_days))
            .with_id(id)
            .with_status(status)
    }

    #[test]
    fn test_delete_then_get_is_none() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.tasks();
        repo.create(&task("t1", "ann", 1, WorkStatus::Pending)).unwrap();

        assert!(repo.delete("t1").unwrap());
        assert!(repo.get_by_id("t1").unwrap().is_none());
        assert!(!repo.delete("t1").unwrap());
    }

    #[test]
    fn test_queries() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.tasks();
        repo.create(&task("t1", "ann", -1, WorkStatus::Pending)).unwrap();
        repo.create(&task("t2", "bob", 2, WorkStatus::InProgress).with_priority(Priority::Low)).unwrap();
        repo.create(&task("t3", "ann", -5, WorkStatus::Completed)).unwrap();

        let by_ann: Vec<String> = repo.find_by_creator("ann").unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(by_ann, vec!["t3", "t1"]);
        assert_eq!(repo.find_by_priority(Priority::Low).unwrap().len(), 1);
        assert_eq!(repo.find_by_status(WorkStatus::Completed).unwrap().len(), 1);

        let overdue: Vec<String> = repo.find_overdue().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(overdue, vec!["t1"]);

        let soon = repo.find_by_due_date_range(&now(), &(now() + Duration::days(3))).unwrap();
        assert_eq!(soon.len(), 1);
    }

    #[test]
    fn test_statistics() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.tasks();
        repo.create(&task("t1", "ann", -1, WorkStatus::Pending)).unwrap();
        repo.create(&task("t2", "ann", -1, WorkStatus::Completed)).unwrap();
        repo.create(&task("t3", "ann", 4, WorkStatus::InProgress)).unwrap();

        assert_eq!(
            repo.get_statistics().unwrap(),
            TaskStatistics {
                total: 3,
                pending: 1,
                in_progress: 1,
                completed: 1,
                overdue: 1,
            }
        );
    }

    #[test]
    fn test_assignment_is_separate_from_contacts() {
        let db = SqliteStorage::open_memory().unwrap();
        let repo = db.tasks();
        repo.create(&task("t1", "ann", 1, WorkStatus::Pending)).unwrap();

        repo.add_contact("t1", "c1").unwrap();
        repo.assign_contact("t1", "c2").unwrap();
        repo.add_company("t1", "co1").unwrap();
        repo.add_deal("t1", "d1").unwrap();

        let loaded = repo.get_with_relationships("t1").unwrap().unwrap();
        assert_eq!(loaded.contact_ids, vec!["c1"]);
        assert_eq!(loaded.assigned_contact_ids, vec!["c2"]);
        assert_eq!(loaded.company_ids, vec!["co1"]);
        assert_eq!(loaded.deal_ids, vec!["d1"]);

        assert!(repo.unassign_contact("t1", "c2").unwrap());
        assert!(repo.remove_deal("t1", "d1").unwrap());
        assert!(repo.remove_company("t1", "co1").unwrap());
        assert!(repo.remove_contact("t1", "c1").unwrap());
        assert!(repo.get_with_relationships("t1").unwrap().unwrap().assigned_contact_ids.is_empty());
    }
}
