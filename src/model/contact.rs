//! Contact model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, SocialLinks};

/// A person in the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier
    pub id: String,

    pub avatar: Option<String>,
    pub initials: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,

    /// Primary company reference (nullable, not enforced)
    pub company_id: Option<String>,

    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,

    /// Social network handles keyed by network name
    pub social_links: Option<SocialLinks>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Create a new contact with a generated id and both timestamps set to now.
    pub fn new(name: &str) -> Self {
        let now = super::now();
        Self {
            id: generate_id("contact"),
            avatar: None,
            initials: None,
            name: name.to_string(),
            email: None,
            phone: None,
            position: None,
            company_id: None,
            address: None,
            state: None,
            city: None,
            zip: None,
            country: None,
            social_links: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Use a caller-supplied id.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    #[must_use]
    pub fn with_company(mut self, company_id: &str) -> Self {
        self.company_id = Some(company_id.to_string());
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }
}
