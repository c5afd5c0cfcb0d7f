//! Error types for the CRM persistence layer.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=database, 3=snapshot, 4=validation, etc.)
//! - Retryability flags
//! - User-actionable recovery hints (notably for storage quota failures)
//! - Structured JSON output for the admin binary's `--json` mode
//!
//! Domain-level absence ("no contact with that id") is never an error:
//! repositories return `Option`/`bool` for it.

use thiserror::Error;

use crate::storage::kv::StoreError;

/// Result type alias for CRM storage operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    EngineInit,
    DatabaseError,
    NotReadBack,

    // Snapshot / durable store (exit 3)
    QuotaExceeded,
    StoreError,
    DecodeError,
    SchemaTooNew,

    // Validation (exit 4)
    InvalidArgument,

    // Migration (exit 5)
    MigrationFailed,
    MissingRollback,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::EngineInit => "ENGINE_INIT",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NotReadBack => "NOT_READ_BACK",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::StoreError => "STORE_ERROR",
            Self::DecodeError => "DECODE_ERROR",
            Self::SchemaTooNew => "SCHEMA_TOO_NEW",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MigrationFailed => "MIGRATION_FAILED",
            Self::MissingRollback => "MISSING_ROLLBACK",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::EngineInit | Self::DatabaseError | Self::NotReadBack => 2,
            Self::QuotaExceeded | Self::StoreError | Self::DecodeError | Self::SchemaTooNew => 3,
            Self::InvalidArgument => 4,
            Self::MigrationFailed | Self::MissingRollback => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the caller can reasonably retry after acting on the hint.
    ///
    /// Quota failures are retryable once space has been freed; schema and
    /// migration failures are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QuotaExceeded | Self::StoreError | Self::InvalidArgument | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in CRM storage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The embedded engine could not be brought up. Fatal, never retried.
    #[error("Could not initialize the embedded database: {0}")]
    EngineInit(String),

    /// The durable store refused the snapshot because it is full.
    ///
    /// The in-memory database is intact but the latest changes are not
    /// persisted.
    #[error("Storage quota exceeded writing '{key}' ({requested} bytes, limit {limit} bytes)")]
    QuotaExceeded {
        key: String,
        limit: u64,
        requested: u64,
    },

    #[error("Durable store error: {0}")]
    Store(String),

    /// An imported snapshot was written by a newer build.
    #[error("Imported database schema (v{found}) is newer than supported version (v{supported})")]
    SchemaTooNew { found: i64, supported: i64 },

    /// A forward migration failed; earlier migrations of the batch stay applied.
    #[error("Migration {version} ({name}) failed: {source}")]
    Migration {
        version: i64,
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Migration {version} ({name}) does not have a rollback function")]
    MissingRollback { version: i64, name: String },

    /// A row was written but could not be read back by id.
    #[error("Failed to retrieve created entity with id: {id} (table {table})")]
    NotReadBack { table: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded {
                key,
                limit,
                requested,
            } => Self::QuotaExceeded {
                key,
                limit,
                requested,
            },
            other => Self::Store(other.to_string()),
        }
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EngineInit(_) => ErrorCode::EngineInit,
            Self::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            Self::Store(_) => ErrorCode::StoreError,
            Self::SchemaTooNew { .. } => ErrorCode::SchemaTooNew,
            Self::Migration { .. } => ErrorCode::MigrationFailed,
            Self::MissingRollback { .. } => ErrorCode::MissingRollback,
            Self::NotReadBack { .. } => ErrorCode::NotReadBack,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Decode(_) => ErrorCode::DecodeError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True when this is the storage-quota condition.
    #[must_use]
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::QuotaExceeded { .. } => Some(
                "Storage quota exceeded. Please clear old data or export the database \
                 (`crm export`) and reset it (`crm reset --yes`)."
                    .to_string(),
            ),

            Self::EngineInit(_) => {
                Some("The embedded SQLite engine could not start; this is not retried.".to_string())
            }

            Self::SchemaTooNew { found, supported } => Some(format!(
                "The file was written by a newer build (schema v{found}). \
                 This build understands up to v{supported}; upgrade before importing."
            )),

            Self::Migration { version, .. } => Some(format!(
                "Migrations before {version} remain applied. \
                 Use `crm migrate status` to inspect the ledger."
            )),

            Self::MissingRollback { version, .. } => Some(format!(
                "Migration {version} is one-way. Export a backup and reset instead."
            )),

            Self::Decode(_) => Some(
                "The stored snapshot is not valid base64. `crm reset --yes` recreates it."
                    .to_string(),
            ),

            Self::NotReadBack { .. }
            | Self::Store(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_error_is_distinct() {
        let err: Error = StoreError::QuotaExceeded {
            key: "agentic_crm_database".to_string(),
            limit: 10,
            requested: 20,
        }
        .into();

        assert!(err.is_quota_exceeded());
        assert_eq!(err.error_code(), ErrorCode::QuotaExceeded);
        assert!(err.hint().unwrap().contains("export"));
    }

    #[test]
    fn test_other_store_errors_are_not_quota() {
        let err: Error = StoreError::Io(std::io::Error::other("disk gone")).into();
        assert!(!err.is_quota_exceeded());
        assert_eq!(err.error_code(), ErrorCode::StoreError);
    }

    #[test]
    fn test_migration_error_names_version() {
        let err = Error::Migration {
            version: 3,
            name: "seed_companies".to_string(),
            source: Box::new(Error::Other("boom".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("seed_companies"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_structured_json() {
        let err = Error::SchemaTooNew {
            found: 9,
            supported: 1,
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "SCHEMA_TOO_NEW");
        assert_eq!(json["error"]["retryable"], false);
        assert!(json["error"]["hint"].is_string());
    }
}
