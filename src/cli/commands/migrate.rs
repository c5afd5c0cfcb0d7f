//! Migration ledger commands.

use colored::Colorize;
use std::path::Path;

use crate::cli::MigrateCommands;
use crate::config::OpenOptions;
use crate::error::{Error, Result};
use crate::storage::migrations::{migration_status, rollback_migration, run_migrations};
use crate::storage::seed::{find_migration, ALL_MIGRATIONS};

use super::open_storage;

/// Execute a `crm migrate` subcommand.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub fn execute(command: &MigrateCommands, data_dir: Option<&Path>, json: bool) -> Result<()> {
    match command {
        MigrateCommands::Status => status(data_dir, json),
        MigrateCommands::Run => run(data_dir, json),
        MigrateCommands::Rollback { version } => rollback(data_dir, *version, json),
    }
}

fn status(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, OpenOptions::without_migrations())?;
    let statuses = migration_status(storage.conn(), ALL_MIGRATIONS)?;

    if json {
        println!("{}", serde_json::to_string(&statuses)?);
    } else {
        for s in &statuses {
            let mark = if s.applied { "applied".green() } else { "pending".yellow() };
            let when = s
                .applied_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            println!("  {:>3}  {:<24}{mark:<10}{}", s.version, s.name, when.dimmed());
        }
    }

    storage.close()
}

fn run(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, OpenOptions::without_migrations())?;
    let applied = run_migrations(&storage, ALL_MIGRATIONS)?;

    if json {
        println!("{}", serde_json::json!({ "applied": applied }));
    } else if applied == 0 {
        println!("No pending migrations");
    } else {
        println!("Applied {applied} migration(s)");
    }

    storage.close()
}

fn rollback(data_dir: Option<&Path>, version: i64, json: bool) -> Result<()> {
    let migration = find_migration(version)
        .ok_or_else(|| Error::InvalidArgument(format!("unknown migration version {version}")))?;

    let storage = open_storage(data_dir, OpenOptions::without_migrations())?;
    rollback_migration(&storage, migration)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "rolled_back": migration.version, "name": migration.name })
        );
    } else {
        println!("Rolled back {} ({})", migration.version, migration.name);
    }

    storage.close()
}
