//! Domain models for the CRM.
//!
//! These are the rich in-memory types handed to callers: dates are
//! `DateTime<Utc>`, structured fields are typed, relation lists are vectors.
//! Their flat storage form lives in [`crate::mapper`].
//!
//! - Contact
//! - Company (with Badge)
//! - Deal
//! - Task
//! - Note
//! - Lookups: Category, ConnectionStrength, EmployeeRange, EstimatedArr

pub mod company;
pub mod contact;
pub mod deal;
pub mod lookup;
pub mod note;
pub mod status;
pub mod task;

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};

pub use company::{Badge, Company};
pub use contact::Contact;
pub use deal::Deal;
pub use lookup::{Category, ConnectionStrength, EmployeeRange, EstimatedArr};
pub use note::Note;
pub use status::{Priority, WorkStatus};
pub use task::Task;

/// Social network name to handle/URL (e.g. `"linkedin" -> "ann-lee"`).
pub type SocialLinks = BTreeMap<String, String>;

/// Generate a prefixed identifier, e.g. `contact_1f0c2a9e4b7d`.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

/// Current time at the precision rows can store.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
