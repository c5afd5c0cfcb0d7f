//! Versioned migrations tracked in a `migrations` ledger table.
//!
//! Migrations are plain Rust functions run against an open
//! [`SqliteStorage`]. Pending migrations run in ascending version order;
//! after each one succeeds its ledger row is written and the whole database
//! is snapshotted. A failure stops the batch but does not undo migrations
//! that already succeeded.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

use super::sqlite::SqliteStorage;
use crate::error::{Error, Result};
use crate::mapper::from_millis;

/// Forward or inverse migration step.
pub type MigrationFn = fn(&SqliteStorage) -> Result<()>;

/// A single migration with version identifier and steps.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub up: MigrationFn,
    pub down: Option<MigrationFn>,
}

/// Ledger view of one declared migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: String,
    pub applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Create the ledger table if it does not exist.
///
/// # Errors
///
/// Returns an error if the DDL fails.
pub fn initialize_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Applied versions in ascending order.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read.
pub fn applied_versions(conn: &Connection) -> Result<Vec<i64>> {
    initialize_migrations_table(conn)?;
    let versions = conn
        .prepare("SELECT version FROM migrations ORDER BY version ASC")?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(versions)
}

/// Whether a version is recorded in the ledger.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read.
pub fn is_applied(conn: &Connection, version: i64) -> Result<bool> {
    initialize_migrations_table(conn)?;
    let found = conn
        .query_row(
            "SELECT 1 FROM migrations WHERE version = ?1",
            [version],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.name,
            chrono::Utc::now().timestamp_millis()
        ],
    )?;
    Ok(())
}

/// Run every pending migration in ascending version order.
///
/// Returns the number of migrations applied; a second run returns 0.
///
/// # Errors
///
/// Returns `Error::Migration` naming the first migration that failed.
/// Earlier migrations of the batch stay applied.
pub fn run_migrations(storage: &SqliteStorage, migrations: &[Migration]) -> Result<usize> {
    let applied: HashSet<i64> = applied_versions(storage.conn())?.into_iter().collect();

    let mut pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();
    pending.sort_by_key(|m| m.version);

    if pending.is_empty() {
        info!("No pending migrations");
        return Ok(0);
    }

    for migration in &pending {
        info!(version = migration.version, name = migration.name, "Applying migration");

        let step = (migration.up)(storage)
            .and_then(|()| record_migration(storage.conn(), migration))
            .and_then(|()| storage.save());

        if let Err(e) = step {
            error!(version = migration.version, name = migration.name, error = %e, "Migration failed");
            return Err(Error::Migration {
                version: migration.version,
                name: migration.name.to_string(),
                source: Box::new(e),
            });
        }

        info!(version = migration.version, "Migration complete");
    }

    Ok(pending.len())
}

/// Undo one migration through its inverse and drop its ledger row.
///
/// # Errors
///
/// Returns `MissingRollback` when the migration has no inverse, or the
/// inverse's own error.
pub fn rollback_migration(storage: &SqliteStorage, migration: &Migration) -> Result<()> {
    let Some(down) = migration.down else {
        return Err(Error::MissingRollback {
            version: migration.version,
            name: migration.name.to_string(),
        });
    };

    info!(version = migration.version, name = migration.name, "Rolling back migration");

    if let Err(e) = down(storage) {
        error!(version = migration.version, error = %e, "Rollback failed");
        return Err(e);
    }

    initialize_migrations_table(storage.conn())?;
    storage
        .conn()
        .execute("DELETE FROM migrations WHERE version = ?1", [migration.version])?;
    storage.save()?;

    info!(version = migration.version, "Migration rolled back");
    Ok(())
}

/// Status of every declared migration against the ledger.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read.
pub fn migration_status(conn: &Connection, migrations: &[Migration]) -> Result<Vec<MigrationStatus>> {
    initialize_migrations_table(conn)?;

    let ledger: HashMap<i64, i64> = conn
        .prepare("SELECT version, applied_at FROM migrations")?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    Ok(migrations
        .iter()
        .map(|m| {
            let applied_at = ledger.get(&m.version).copied().map(from_millis);
            MigrationStatus {
                version: m.version,
                name: m.name.to_string(),
                applied: applied_at.is_some(),
                applied_at,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::table_names;

    fn create_widgets(storage: &SqliteStorage) -> Result<()> {
        storage.execute_batch("CREATE TABLE widgets (id TEXT PRIMARY KEY)")
    }

    fn drop_widgets(storage: &SqliteStorage) -> Result<()> {
        storage.execute_batch("DROP TABLE widgets")
    }

    fn insert_widget(storage: &SqliteStorage) -> Result<()> {
        storage.execute_batch("INSERT INTO widgets (id) VALUES ('w1')")
    }

    fn broken(storage: &SqliteStorage) -> Result<()> {
        storage.execute_batch("INSERT INTO nowhere VALUES (1)")
    }

    const CREATE: Migration = Migration {
        version: 1,
        name: "create_widgets",
        up: create_widgets,
        down: Some(drop_widgets),
    };

    const INSERT: Migration = Migration {
        version: 2,
        name: "insert_widget",
        up: insert_widget,
        down: None,
    };

    const BROKEN: Migration = Migration {
        version: 3,
        name: "broken",
        up: broken,
        down: None,
    };

    #[test]
    fn test_runs_in_version_order() {
        let storage = SqliteStorage::open_memory().unwrap();
        // Declared out of order; insert needs the table from version 1
        let applied = run_migrations(&storage, &[INSERT, CREATE]).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(applied_versions(storage.conn()).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_run_is_idempotent() {
        let storage = SqliteStorage::open_memory().unwrap();
        assert_eq!(run_migrations(&storage, &[CREATE, INSERT]).unwrap(), 2);
        assert_eq!(run_migrations(&storage, &[CREATE, INSERT]).unwrap(), 0);

        let n: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM widgets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_failure_names_migration_and_keeps_earlier() {
        let storage = SqliteStorage::open_memory().unwrap();
        let err = run_migrations(&storage, &[CREATE, BROKEN, INSERT]).unwrap_err();

        match err {
            Error::Migration { version, name, .. } => {
                assert_eq!(version, 3);
                assert_eq!(name, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }

        // Version 1 stays applied, version 2 ran before the failure
        assert!(is_applied(storage.conn(), 1).unwrap());
        assert!(is_applied(storage.conn(), 2).unwrap());
        assert!(!is_applied(storage.conn(), 3).unwrap());
    }

    #[test]
    fn test_rollback() {
        let storage = SqliteStorage::open_memory().unwrap();
        run_migrations(&storage, &[CREATE]).unwrap();

        rollback_migration(&storage, &CREATE).unwrap();
        assert!(!is_applied(storage.conn(), 1).unwrap());
        assert!(!table_names(storage.conn()).unwrap().contains(&"widgets".to_string()));

        // Pending again
        assert_eq!(run_migrations(&storage, &[CREATE]).unwrap(), 1);
    }

    #[test]
    fn test_rollback_without_inverse_fails() {
        let storage = SqliteStorage::open_memory().unwrap();
        run_migrations(&storage, &[CREATE, INSERT]).unwrap();

        let err = rollback_migration(&storage, &INSERT).unwrap_err();
        assert!(matches!(err, Error::MissingRollback { version: 2, .. }));
        assert!(is_applied(storage.conn(), 2).unwrap());
    }

    #[test]
    fn test_status() {
        let storage = SqliteStorage::open_memory().unwrap();
        run_migrations(&storage, &[CREATE]).unwrap();

        let status = migration_status(storage.conn(), &[CREATE, INSERT]).unwrap();
        assert_eq!(status.len(), 2);
        assert!(status[0].applied);
        assert!(status[0].applied_at.is_some());
        assert!(!status[1].applied);
        assert_eq!(status[1].name, "insert_widget");
    }
}
