//! Read-only inspection commands plus `vacuum`.

use colored::Colorize;
use std::path::Path;

use crate::config::OpenOptions;
use crate::error::Result;
use crate::storage::Table;

use super::open_storage;

/// Inspection never seeds or migrates.
fn options() -> OpenOptions {
    OpenOptions::without_migrations()
}

/// Execute `crm stats`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or counted.
pub fn stats(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, options())?;
    let stats = storage.stats()?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!("{}", "Database".cyan().bold());
        println!("  Schema version: v{}", stats.schema_version);
        println!("  Size:           {} bytes", stats.size_bytes);
        println!();
        println!("{}", "Rows".cyan().bold());
        for table in &stats.tables {
            let count = if table.count == 0 {
                table.count.to_string().dimmed()
            } else {
                table.count.to_string().normal()
            };
            println!("  {:<34}{count:>6}", table.name);
        }
    }

    storage.close()
}

/// Execute `crm report`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn report(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, options())?;
    let report = storage.debug_report()?;

    if json {
        println!("{}", serde_json::json!({ "report": report }));
    } else {
        print!("{report}");
    }

    storage.close()
}

/// Execute `crm schema`.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read.
pub fn schema(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, options())?;
    let tables = storage.table_schemas()?;
    let indexes = storage.indexes()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "tables": tables, "indexes": indexes })
        );
    } else {
        for table in &tables {
            println!("{}", table.name.yellow().bold());
            println!("{};", table.sql);
            println!();
        }
        println!("{}", "Indexes".cyan().bold());
        for index in &indexes {
            println!("  {} {}", index.name.bold(), format!("on {}", index.table).dimmed());
        }
    }

    storage.close()
}

/// Execute `crm sample <table>`.
///
/// # Errors
///
/// Returns an error if the table cannot be read.
pub fn sample(data_dir: Option<&Path>, table: Table, limit: u32, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, options())?;
    let rows = storage.sample(table, limit)?;

    if json {
        println!("{}", serde_json::to_string(&rows)?);
    } else if rows.is_empty() {
        println!("{} is empty.", table);
    } else {
        println!("{} {}", table.to_string().yellow().bold(), format!("({} rows)", rows.len()).dimmed());
        for row in &rows {
            println!("{}", serde_json::to_string_pretty(row)?);
        }
    }

    storage.close()
}

/// Execute `crm check`.
///
/// Violations are reported, not repaired.
///
/// # Errors
///
/// Returns an error if the integrity check cannot run.
pub fn check(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, options())?;
    let violations = storage.check_foreign_keys()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": violations.is_empty(), "violations": violations })
        );
    } else if violations.is_empty() {
        println!("{}", "No foreign key violations".green());
    } else {
        println!(
            "{}",
            format!("{} foreign key violation(s)", violations.len()).red().bold()
        );
        for v in &violations {
            let rowid = v.rowid.map_or_else(|| "-".to_string(), |r| r.to_string());
            println!("  {} row {rowid} -> {} (fk {})", v.table, v.parent, v.fk_index);
        }
    }

    storage.close()
}

/// Execute `crm vacuum`.
///
/// # Errors
///
/// Returns an error if the vacuum or the following save fails.
pub fn vacuum(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, options())?;
    let before = storage.stats()?.size_bytes;
    storage.vacuum()?;
    let after = storage.stats()?.size_bytes;

    if json {
        println!("{}", serde_json::json!({ "before_bytes": before, "after_bytes": after }));
    } else {
        println!("Vacuumed: {before} -> {after} bytes");
    }

    storage.close()
}
