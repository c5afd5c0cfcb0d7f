//! Task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, Priority, WorkStatus};

/// A unit of follow-up work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: String,

    pub title: String,
    pub content: String,
    pub created_by: String,

    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,

    pub due_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,

    #[serde(default)]
    pub company_ids: Vec<String>,
    #[serde(default)]
    pub contact_ids: Vec<String>,
    #[serde(default)]
    pub deal_ids: Vec<String>,
    #[serde(default)]
    pub assigned_contact_ids: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task with a generated id.
    pub fn new(title: &str, content: &str, created_by: &str, due_at: DateTime<Utc>) -> Self {
        let now = super::now();
        Self {
            id: generate_id("task"),
            title: title.to_string(),
            content: content.to_string(),
            created_by: created_by.to_string(),
            status: Some(WorkStatus::Pending),
            priority: None,
            due_at,
            completed_at: None,
            completed_by: None,
            company_ids: Vec::new(),
            contact_ids: Vec::new(),
            deal_ids: Vec::new(),
            assigned_contact_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: WorkStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}
