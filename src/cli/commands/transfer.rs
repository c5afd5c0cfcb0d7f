//! Export, import and reset.

use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{OpenOptions, DEFAULT_EXPORT_FILENAME};
use crate::error::{Error, Result};
use crate::storage::migrations::run_migrations;
use crate::storage::ALL_MIGRATIONS;

use super::open_storage;

#[derive(Serialize)]
struct TransferOutput {
    path: PathBuf,
    bytes: usize,
    schema_version: i64,
}

/// Execute `crm export`.
///
/// # Errors
///
/// Returns an error if the export or the file write fails.
pub fn export(data_dir: Option<&Path>, output: Option<&Path>, json: bool) -> Result<()> {
    let storage = open_storage(data_dir, OpenOptions::without_migrations())?;

    let target = output.map_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILENAME), Path::to_path_buf);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidArgument(format!("invalid output path {}", target.display())))?;

    let path = storage.download(&dir, Some(filename))?;
    let bytes = usize::try_from(std::fs::metadata(&path)?.len()).unwrap_or(usize::MAX);

    if json {
        let out = TransferOutput {
            path,
            bytes,
            schema_version: storage.schema_version(),
        };
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("Exported {bytes} bytes to {}", path.display());
    }

    storage.close()
}

/// Execute `crm import <file>`.
///
/// # Errors
///
/// Returns `SchemaTooNew` for images from a newer build, or an error if the
/// file cannot be read or the result cannot be saved.
pub fn import(data_dir: Option<&Path>, file: &Path, json: bool) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let mut storage = open_storage(data_dir, OpenOptions::without_migrations())?;
    storage.import(&bytes)?;

    if json {
        let out = TransferOutput {
            path: file.to_path_buf(),
            bytes: bytes.len(),
            schema_version: storage.schema_version(),
        };
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("Imported {} bytes from {}", bytes.len(), file.display());
    }

    storage.close()
}

/// Execute `crm reset --yes`.
///
/// The default migrations run again on the empty schema.
///
/// # Errors
///
/// Returns `InvalidArgument` without `--yes`, or an error from the reset.
pub fn reset(data_dir: Option<&Path>, yes: bool, json: bool) -> Result<()> {
    if !yes {
        return Err(Error::InvalidArgument(
            "reset deletes every record; pass --yes to confirm".to_string(),
        ));
    }

    let mut storage = open_storage(data_dir, OpenOptions::without_migrations())?;
    storage.reset()?;
    let applied = run_migrations(&storage, ALL_MIGRATIONS)?;

    if json {
        println!("{}", serde_json::json!({ "reset": true, "migrations_applied": applied }));
    } else {
        println!("{}", "Database reset".yellow().bold());
        println!("  Migrations: {applied} applied");
    }

    storage.close()
}
