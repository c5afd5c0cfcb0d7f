//! Lookup table records referenced by companies.

use serde::{Deserialize, Serialize};

/// Industry category (many-to-many with companies).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub bullet: Option<String>,
    pub description: Option<String>,
}

/// Relationship strength with a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStrength {
    pub id: String,
    pub name: String,
    /// CSS class list used by the front end
    pub color: Option<String>,
}

/// Headcount band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRange {
    pub id: String,
    pub label: String,
}

/// Annual recurring revenue band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedArr {
    pub id: String,
    pub label: String,
}
