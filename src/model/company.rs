//! Company model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

/// Badge shown next to a company (e.g. "Hot lead" / "active").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    pub state: String,
}

/// An organization in the CRM.
///
/// `category_ids` and `contact_ids` live in junction tables; the mapper
/// leaves them empty and repositories fill them on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier
    pub id: String,

    pub logo: Option<String>,
    pub name: String,
    pub domain: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub contact_ids: Vec<String>,

    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,

    pub angel_list: Option<String>,
    pub linkedin: Option<String>,
    pub x: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub telegram: Option<String>,

    /// Lookup references
    pub connection_strength_id: Option<String>,
    pub estimated_arr_id: Option<String>,
    pub employee_range_id: Option<String>,

    pub founded_at: Option<DateTime<Utc>>,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub last_contacted: Option<String>,
    pub team_id: Option<String>,
    pub badge: Option<Badge>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Create a new company with a generated id.
    pub fn new(name: &str) -> Self {
        let now = super::now();
        Self {
            id: generate_id("company"),
            logo: None,
            name: name.to_string(),
            domain: None,
            email: None,
            phone: None,
            description: None,
            category_ids: Vec::new(),
            contact_ids: Vec::new(),
            address: None,
            state: None,
            city: None,
            zip: None,
            country: None,
            angel_list: None,
            linkedin: None,
            x: None,
            instagram: None,
            facebook: None,
            telegram: None,
            connection_strength_id: None,
            estimated_arr_id: None,
            employee_range_id: None,
            founded_at: None,
            last_interaction_at: None,
            last_contacted: None,
            team_id: None,
            badge: None,
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
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }
}
