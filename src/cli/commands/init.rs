//! Create the CRM database under the data directory.
//!
//! The database is never a plain file on disk: it lives in the store
//! directory as a base64 snapshot, so `init` simply opens the store with
//! migrations enabled and reports what was seeded.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{resolve_data_dir, store_dir, OpenOptions, DB_STORAGE_KEY};
use crate::error::{Error, Result};
use crate::storage::migrations::applied_versions;
use crate::storage::{FileStore, KeyValueStore, SqliteStorage};

#[derive(Serialize)]
struct InitOutput {
    path: PathBuf,
    schema_version: i64,
    migrations_applied: usize,
    size_bytes: u64,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `InvalidArgument` if a database already exists and `force` is
/// not set, or any error from opening the store.
pub fn execute(data_dir: Option<&Path>, force: bool, json: bool) -> Result<()> {
    let dir = store_dir(&resolve_data_dir(data_dir)?);
    let store = FileStore::open(&dir)?;

    if !force && store.get(DB_STORAGE_KEY)?.is_some() {
        return Err(Error::InvalidArgument(format!(
            "database already initialized at {} (use --force to replace it)",
            dir.display()
        )));
    }

    let storage = SqliteStorage::open(Box::new(store), OpenOptions {
        force_new: force,
        ..OpenOptions::default()
    })?;
    let stats = storage.stats()?;
    let migrations_applied = applied_versions(storage.conn())?.len();

    if json {
        let output = InitOutput {
            path: dir,
            schema_version: stats.schema_version,
            migrations_applied,
            size_bytes: stats.size_bytes,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized CRM database");
        println!("  Store:      {}", dir.display());
        println!("  Schema:     v{}", stats.schema_version);
        println!("  Migrations: {migrations_applied} applied");
    }

    storage.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_existing_database() {
        let temp = TempDir::new().unwrap();
        execute(Some(temp.path()), false, true).unwrap();
        assert!(store_dir(temp.path()).join(DB_STORAGE_KEY).exists());

        let err = execute(Some(temp.path()), false, true).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        execute(Some(temp.path()), true, true).unwrap();
    }
}
