//! Deal model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, Priority, WorkStatus};

/// A sales opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Unique identifier
    pub id: String,

    pub title: String,
    pub content: String,

    /// Owner display name
    pub user_name: String,
    pub avatar: Option<String>,

    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,

    pub due_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,

    /// Comment counter
    pub comments: i64,

    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_type: Option<String>,
    pub contract_number: Option<String>,
    pub discount: Option<f64>,

    /// Junction-backed relations, filled by the repository on request
    #[serde(default)]
    pub company_ids: Vec<String>,
    #[serde(default)]
    pub contact_ids: Vec<String>,
    #[serde(default)]
    pub related_deal_ids: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Create a new pending deal with a generated id.
    pub fn new(title: &str, content: &str, user_name: &str, due_at: DateTime<Utc>) -> Self {
        let now = super::now();
        Self {
            id: generate_id("deal"),
            title: title.to_string(),
            content: content.to_string(),
            user_name: user_name.to_string(),
            avatar: None,
            status: Some(WorkStatus::Pending),
            priority: None,
            due_at,
            completed_at: None,
            completed_by: None,
            comments: 0,
            amount: None,
            currency: None,
            payment_date: None,
            payment_type: None,
            contract_number: None,
            discount: None,
            company_ids: Vec::new(),
            contact_ids: Vec::new(),
            related_deal_ids: Vec::new(),
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

    #[must_use]
    pub fn with_amount(mut self, amount: f64, currency: &str) -> Self {
        self.amount = Some(amount);
        self.currency = Some(currency.to_string());
        self
    }
}
