//! Persistence layer.
//!
//! The database is an in-memory SQLite engine whose full image is
//! snapshotted to a durable key-value store after every write:
//! - Closed identifiers and parameterized queries only
//! - Foreign keys declared, checked on demand
//! - Versioned migrations tracked in a ledger table
//!
//! # Submodules
//!
//! - [`engine`] - Engine adapter (open, export/import image, close)
//! - [`schema`] - Schema definitions and version record
//! - [`kv`] - Durable key-value stores
//! - [`snapshot`] - Base64 snapshot save/load
//! - [`migrations`] - Migration runner; [`seed`] holds the default list
//! - [`canonical`] - Status/priority text repair
//! - [`ident`], [`query`] - Identifiers and query helpers
//! - [`sqlite`] - The `SqliteStorage` handle

pub mod canonical;
pub mod engine;
pub mod ident;
pub mod kv;
pub mod migrations;
pub mod query;
pub mod schema;
pub mod seed;
pub mod snapshot;
pub mod sqlite;

pub use engine::Engine;
pub use ident::{Column, Junction, Table};
pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use migrations::{Migration, MigrationStatus};
pub use query::{Condition, Direction, OrderBy, Page, Statement};
pub use seed::ALL_MIGRATIONS;
pub use sqlite::{DatabaseStats, ForeignKeyViolation, IndexInfo, SqliteStorage, TableCount, TableSchema};
