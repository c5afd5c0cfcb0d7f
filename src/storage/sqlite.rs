//! The database handle.
//!
//! `SqliteStorage` owns the in-memory engine and the durable store its
//! snapshots go to. It is created once at startup and borrowed by every
//! repository; there is no process-wide instance.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use super::canonical::canonicalize_workflow_text;
use super::engine::Engine;
use super::ident::{Junction, Table};
use super::kv::{KeyValueStore, MemoryStore};
use super::migrations::run_migrations;
use super::query::{self, execute_query, execute_transaction, Statement};
use super::schema::{apply_schema, schema_version};
use super::seed::ALL_MIGRATIONS;
use super::snapshot;
use crate::config::{OpenOptions, StorageKeys, DEFAULT_EXPORT_FILENAME};
use crate::error::Result;
use crate::mapper::{COMPANY_MAPPER, CONTACT_MAPPER, DEAL_MAPPER, NOTE_MAPPER, TASK_MAPPER};
use crate::repository::{
    CompanyRepository, ContactRepository, DealRepository, LookupRepository, NoteRepository,
    Repository, TaskRepository,
};

/// Row count of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub name: String,
    pub count: u64,
}

/// Size and shape of the database.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    /// Byte length of the exported image
    pub size_bytes: u64,
    pub tables: Vec<TableCount>,
    pub schema_version: i64,
}

impl DatabaseStats {
    /// Count for one table, if it was measured.
    #[must_use]
    pub fn count_of(&self, name: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.name == name).map(|t| t.count)
    }
}

/// One row of `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
    pub fk_index: i64,
}

/// Stored DDL for a table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub sql: String,
}

/// Stored DDL for an index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub table: String,
    pub sql: String,
}

/// Explicit database handle.
pub struct SqliteStorage {
    engine: Engine,
    store: Box<dyn KeyValueStore>,
    keys: StorageKeys,
    run_migrations: bool,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("engine", &self.engine)
            .field("keys", &self.keys)
            .field("run_migrations", &self.run_migrations)
            .finish_non_exhaustive()
    }
}

fn fresh_engine() -> Result<Engine> {
    let engine = Engine::open_in_memory()?;
    apply_schema(engine.conn())?;
    Ok(engine)
}

impl SqliteStorage {
    /// Open the database kept in `store`.
    ///
    /// Loads the stored snapshot unless `options.force_new` is set or there
    /// is no usable snapshot, in which case a fresh schema is created. The
    /// default migration list runs when `options.run_migrations` is set, and
    /// the result is saved.
    ///
    /// # Errors
    ///
    /// Returns `EngineInit` if the engine cannot start, a schema error, or a
    /// migration error. A full store on the final save is logged and the
    /// handle is still returned.
    pub fn open(store: Box<dyn KeyValueStore>, options: OpenOptions) -> Result<Self> {
        let loaded = if options.force_new {
            None
        } else {
            snapshot::load(store.as_ref(), &options.keys)?
        };

        let engine = match loaded {
            Some(engine) => engine,
            None => {
                info!("Creating new database");
                fresh_engine()?
            }
        };

        let storage = Self {
            engine,
            store,
            keys: options.keys,
            run_migrations: options.run_migrations,
        };

        if storage.run_migrations {
            run_migrations(&storage, ALL_MIGRATIONS)?;
        }

        match storage.save() {
            Err(e) if e.is_quota_exceeded() => {
                warn!(error = %e, "Opened database could not be persisted");
            }
            other => other?,
        }

        info!(version = storage.schema_version(), "Database initialized");
        Ok(storage)
    }

    /// Fresh handle over a process-local store, schema applied, no
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot start or the schema fails.
    pub fn open_memory() -> Result<Self> {
        Self::open(Box::new(MemoryStore::new()), OpenOptions {
            force_new: true,
            ..OpenOptions::without_migrations()
        })
    }

    /// Borrow the connection.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        self.engine.conn()
    }

    /// Execute raw SQL against the engine. Does not snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first statement error.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.engine.execute_batch(sql)
    }

    /// Schema version recorded inside the database.
    #[must_use]
    pub fn schema_version(&self) -> i64 {
        schema_version(self.conn())
    }

    /// Snapshot the whole database to the durable store.
    ///
    /// # Errors
    ///
    /// Returns `QuotaExceeded` when the store is full; the in-memory state is
    /// untouched either way.
    pub fn save(&self) -> Result<()> {
        snapshot::save(&self.engine, self.store.as_ref(), &self.keys)
    }

    /// Native SQLite image of the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup fails.
    pub fn export(&self) -> Result<Vec<u8>> {
        self.engine.export()
    }

    /// Replace the database with an external image and save it.
    ///
    /// Synonym status and priority text in the image (`done`, `urgent`, ...)
    /// is rewritten to its canonical spelling before the swap.
    ///
    /// # Errors
    ///
    /// Returns `SchemaTooNew` if the image was written by a newer build, in
    /// which case the active database is untouched.
    pub fn import(&mut self, bytes: &[u8]) -> Result<()> {
        let engine = Engine::from_bytes(bytes)?;

        let found = schema_version(engine.conn());
        if found > super::schema::SCHEMA_VERSION {
            if let Err(e) = engine.close() {
                warn!(error = %e, "Failed to close rejected import");
            }
            return Err(crate::error::Error::SchemaTooNew {
                found,
                supported: super::schema::SCHEMA_VERSION,
            });
        }

        canonicalize_workflow_text(engine.conn())?;

        self.swap_engine(engine);
        self.save()?;

        info!(bytes = bytes.len(), version = found, "Database imported");
        Ok(())
    }

    /// Drop everything and start again from an empty schema.
    ///
    /// Both snapshot keys are removed first; the migration list runs again
    /// when the handle was opened with migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared or the new database
    /// cannot be built or saved.
    pub fn reset(&mut self) -> Result<()> {
        snapshot::clear(self.store.as_ref(), &self.keys)?;
        self.swap_engine(fresh_engine()?);

        if self.run_migrations {
            run_migrations(self, ALL_MIGRATIONS)?;
        }
        self.save()?;

        info!("Database reset");
        Ok(())
    }

    fn swap_engine(&mut self, engine: Engine) {
        let old = std::mem::replace(&mut self.engine, engine);
        if let Err(e) = old.close() {
            warn!(error = %e, "Failed to close previous database");
        }
    }

    /// Close the engine. Unsaved changes are lost.
    ///
    /// # Errors
    ///
    /// Returns the SQLite error if the connection could not be closed.
    pub fn close(self) -> Result<()> {
        self.engine.close()
    }

    /// Write the export to `dir/<filename>` (default `agentic-crm-db.sqlite`).
    ///
    /// # Errors
    ///
    /// Returns an error if the export or the file write fails.
    pub fn download(&self, dir: &Path, filename: Option<&str>) -> Result<PathBuf> {
        let path = dir.join(filename.unwrap_or(DEFAULT_EXPORT_FILENAME));
        std::fs::write(&path, self.export()?)?;
        info!(path = %path.display(), "Database exported");
        Ok(path)
    }

    /// Row counts of every known table plus export size and version.
    ///
    /// # Errors
    ///
    /// Returns an error if a count or the export fails.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let mut tables = Vec::with_capacity(Table::ALL.len() + Junction::ALL.len());

        for table in Table::ALL {
            tables.push(TableCount {
                name: table.as_str().to_string(),
                count: query::count(self.conn(), table, &query::Condition::All)?,
            });
        }
        for junction in Junction::ALL {
            let sql = format!("SELECT COUNT(*) FROM {junction}");
            let n: i64 = self.conn().query_row(&sql, [], |row| row.get(0))?;
            tables.push(TableCount {
                name: junction.as_str().to_string(),
                count: u64::try_from(n).unwrap_or(0),
            });
        }

        Ok(DatabaseStats {
            size_bytes: u64::try_from(self.export()?.len()).unwrap_or(u64::MAX),
            tables,
            schema_version: self.schema_version(),
        })
    }

    /// Every foreign key violation in the database.
    ///
    /// Foreign keys are not enforced on write; this is the only check.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma fails.
    pub fn check_foreign_keys(&self) -> Result<Vec<ForeignKeyViolation>> {
        let violations = execute_query(self.conn(), "PRAGMA foreign_key_check", &[], |row| {
            Ok(ForeignKeyViolation {
                table: row.get(0)?,
                rowid: row.get(1)?,
                parent: row.get(2)?,
                fk_index: row.get(3)?,
            })
        })?;

        if violations.is_empty() {
            info!("No foreign key violations");
        } else {
            warn!(count = violations.len(), "Foreign key violations found");
        }
        Ok(violations)
    }

    /// Rebuild the database file, then save.
    ///
    /// # Errors
    ///
    /// Returns an error if VACUUM or the save fails.
    pub fn vacuum(&self) -> Result<()> {
        self.engine.execute_batch("VACUUM")?;
        self.save()
    }

    /// Run raw statements atomically and save once after commit.
    ///
    /// # Errors
    ///
    /// Returns the first failing statement's error after rolling back.
    pub fn transaction(&self, statements: &[Statement]) -> Result<()> {
        execute_transaction(self.conn(), statements)?;
        self.save()
    }

    /// DDL of every user table, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `sqlite_master` cannot be read.
    pub fn table_schemas(&self) -> Result<Vec<TableSchema>> {
        execute_query(
            self.conn(),
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
            &[],
            |row| {
                Ok(TableSchema {
                    name: row.get(0)?,
                    sql: row.get(1)?,
                })
            },
        )
    }

    /// DDL of every explicit index, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `sqlite_master` cannot be read.
    pub fn indexes(&self) -> Result<Vec<IndexInfo>> {
        execute_query(
            self.conn(),
            "SELECT name, tbl_name, sql FROM sqlite_master
             WHERE type = 'index' AND sql IS NOT NULL
             ORDER BY name",
            &[],
            |row| {
                Ok(IndexInfo {
                    name: row.get(0)?,
                    table: row.get(1)?,
                    sql: row.get(2)?,
                })
            },
        )
    }

    /// Up to `limit` raw rows of a table as JSON objects.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn sample(&self, table: Table, limit: u32) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let sql = format!("SELECT * FROM {table} LIMIT ?");
        let mut stmt = self.conn().prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map([limit], |row| {
                let mut object = serde_json::Map::new();
                for (i, name) in names.iter().enumerate() {
                    object.insert(name.clone(), json_value(row.get_ref(i)?));
                }
                Ok(object)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Plain-text summary of version, size and row counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats cannot be gathered.
    pub fn debug_report(&self) -> Result<String> {
        let stats = self.stats()?;
        let rule = "=".repeat(60);

        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Agentic CRM Database Debug Report");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "Generated: {}",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        );
        let _ = writeln!(out, "Schema Version: v{}", stats.schema_version);
        #[allow(clippy::cast_precision_loss)]
        let kb = stats.size_bytes as f64 / 1024.0;
        let _ = writeln!(out, "Database Size: {kb:.2} KB");
        let _ = writeln!(out);
        let _ = writeln!(out, "Table Record Counts:");
        for table in &stats.tables {
            let _ = writeln!(out, "  {:<30}{:>6} rows", table.name, table.count);
        }
        let _ = writeln!(out, "{rule}");
        Ok(out)
    }

    // ── Repositories ─────────────────────────────────────────

    #[must_use]
    pub const fn contacts(&self) -> ContactRepository<'_> {
        Repository::new(self, CONTACT_MAPPER)
    }

    #[must_use]
    pub const fn companies(&self) -> CompanyRepository<'_> {
        Repository::new(self, COMPANY_MAPPER)
    }

    #[must_use]
    pub const fn deals(&self) -> DealRepository<'_> {
        Repository::new(self, DEAL_MAPPER)
    }

    #[must_use]
    pub const fn tasks(&self) -> TaskRepository<'_> {
        Repository::new(self, TASK_MAPPER)
    }

    #[must_use]
    pub const fn notes(&self) -> NoteRepository<'_> {
        Repository::new(self, NOTE_MAPPER)
    }

    #[must_use]
    pub const fn lookups(&self) -> LookupRepository<'_> {
        LookupRepository::new(self)
    }
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    use base64::Engine as _;

    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => i.into(),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(serde_json::Value::Null, Into::into),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned().into(),
        ValueRef::Blob(b) => base64::engine::general_purpose::STANDARD.encode(b).into(),
    }
}
