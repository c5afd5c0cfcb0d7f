//! Task row and mapper.

use rusqlite::types::Value;
use rusqlite::Row;

use super::{
    from_millis, opt_date, opt_millis, opt_text, parse_priority, parse_status, text, to_millis,
    Mapper, TableRow,
};
use crate::model::Task;
use crate::storage::ident::{Column, Table};

/// Flat `tasks` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_by: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_at: i64,
    pub completed_at: Option<i64>,
    pub completed_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TableRow for TaskRow {
    const TABLE: Table = Table::Tasks;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> Vec<(Column, Value)> {
        vec![
            (Column::Id, text(&self.id)),
            (Column::Title, text(&self.title)),
            (Column::Content, text(&self.content)),
            (Column::CreatedBy, text(&self.created_by)),
            (Column::Status, opt_text(self.status.as_ref())),
            (Column::Priority, opt_text(self.priority.as_ref())),
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
            priority: row.get("priority")?,
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
pub fn task_to_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        content: task.content.clone(),
        created_by: task.created_by.clone(),
        status: task.status.map(|s| s.as_str().to_string()),
        priority: task.priority.map(|p| p.as_str().to_string()),
        due_at: to_millis(&task.due_at),
        completed_at: opt_millis(task.completed_at.as_ref()),
        completed_by: task.completed_by.clone(),
        created_at: to_millis(&task.created_at),
        updated_at: to_millis(&task.updated_at),
    }
}

#[must_use]
pub fn task_from_row(row: TaskRow) -> Task {
    Task {
        status: parse_status(&row.id, row.status.as_deref()),
        priority: parse_priority(&row.id, row.priority.as_deref()),
        due_at: from_millis(row.due_at),
        completed_at: opt_date(row.completed_at),
        created_at: from_millis(row.created_at),
        updated_at: from_millis(row.updated_at),
        company_ids: Vec::new(),
        contact_ids: Vec::new(),
        deal_ids: Vec::new(),
        assigned_contact_ids: Vec::new(),
        id: row.id,
        title: row.title,
        content: row.content,
        created_by: row.created_by,
        completed_by: row.completed_by,
    }
}

pub const TASK_MAPPER: Mapper<Task, TaskRow> = Mapper {
    to_row: task_to_row,
    from_row: task_from_row,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{now, Priority, WorkStatus};

    #[test]
    fn test_round_trip() {
        let mut task = Task::new("Follow up", "Send the deck", "sam", now())
            .with_id("t1")
            .with_priority(Priority::Low)
            .with_status(WorkStatus::Completed);
        task.completed_at = Some(now());
        task.completed_by = Some("sam".to_string());

        assert_eq!(task_from_row(task_to_row(&task)), task);
    }

    #[test]
    fn test_null_status_stays_absent() {
        let mut task = Task::new("Follow up", "", "sam", now());
        task.status = None;

        let row = task_to_row(&task);
        assert_eq!(row.status, None);
        assert_eq!(task_from_row(row).status, None);
    }
}
