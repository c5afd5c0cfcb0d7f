//! Workflow status and priority shared by deals, tasks and notes.

use serde::{Deserialize, Serialize};

use crate::validate::{normalize_priority, normalize_status};

/// Workflow status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl WorkStatus {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Parse stored or user text, accepting synonyms ("done", "wip", ...).
    ///
    /// Returns `None` for text that does not resolve to a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_status(s).ok()? {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Priority values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse stored or user text, accepting synonyms ("urgent", "normal", ...).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_priority(s).ok()? {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(WorkStatus::parse("pending"), Some(WorkStatus::Pending));
        assert_eq!(WorkStatus::parse("in_progress"), Some(WorkStatus::InProgress));
        assert_eq!(WorkStatus::parse("done"), Some(WorkStatus::Completed));
        assert_eq!(WorkStatus::parse("unknown"), None);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [WorkStatus::Pending, WorkStatus::InProgress, WorkStatus::Completed] {
            assert_eq!(WorkStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse("normal"), Some(Priority::Medium));
        assert_eq!(Priority::parse("p9"), None);
    }
}
