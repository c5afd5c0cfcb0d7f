//! Configuration management.
//!
//! The persistence layer itself has no runtime configuration: storage keys,
//! the schema version and the default page size are compiled-in constants.
//! The admin binary additionally resolves a data directory that backs the
//! durable file store.
//!
//! # Data directory
//!
//! Priority:
//! 1. `--data-dir` flag (or `CRM_DATA_DIR`, wired through clap's `env`)
//! 2. Global location: `~/.agentic-crm/`
//!
//! Snapshot keys live as individual files under `<data-dir>/store/`.

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};

pub use crate::storage::schema::SCHEMA_VERSION;

/// Durable-store key holding the base64 database image.
pub const DB_STORAGE_KEY: &str = "agentic_crm_database";

/// Durable-store key holding the schema version of the last save.
pub const DB_VERSION_KEY: &str = "agentic_crm_db_version";

/// Page size used when a caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Filename offered for a downloaded database export.
pub const DEFAULT_EXPORT_FILENAME: &str = "agentic-crm-db.sqlite";

/// Name of the global data directory under the user's home.
const GLOBAL_DIR_NAME: &str = ".agentic-crm";

/// Subdirectory of the data directory that holds the key files.
const STORE_DIR_NAME: &str = "store";

/// The pair of durable-store keys used by snapshot persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub database: String,
    pub version: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            database: DB_STORAGE_KEY.to_string(),
            version: DB_VERSION_KEY.to_string(),
        }
    }
}

/// Options for [`SqliteStorage::open`](crate::storage::SqliteStorage::open).
#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub keys: StorageKeys,
    /// Run the default migration list after opening.
    pub run_migrations: bool,
    /// Ignore any stored snapshot and start from a fresh schema.
    pub force_new: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            run_migrations: true,
            force_new: false,
        }
    }
}

impl OpenOptions {
    /// Options that skip the migration list.
    #[must_use]
    pub fn without_migrations() -> Self {
        Self {
            run_migrations: false,
            ..Self::default()
        }
    }
}

/// Get the global CRM data directory (`~/.agentic-crm`).
#[must_use]
pub fn global_crm_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(GLOBAL_DIR_NAME))
}

/// Resolve the data directory for the admin binary.
///
/// # Errors
///
/// Returns `Error::Config` if no explicit directory is given and the home
/// directory cannot be determined.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    global_crm_dir().ok_or_else(|| {
        Error::Config("Could not determine home directory; pass --data-dir".to_string())
    })
}

/// Directory holding the durable key files for a data directory.
#[must_use]
pub fn store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/crm-test"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/crm-test"));
        assert_eq!(store_dir(&dir), PathBuf::from("/tmp/crm-test/store"));
    }

    #[test]
    fn test_default_keys() {
        let keys = StorageKeys::default();
        assert_eq!(keys.database, "agentic_crm_database");
        assert_eq!(keys.version, "agentic_crm_db_version");
    }

    #[test]
    fn test_open_options() {
        assert!(OpenOptions::default().run_migrations);
        assert!(!OpenOptions::without_migrations().run_migrations);
        assert!(!OpenOptions::default().force_new);
    }
}
