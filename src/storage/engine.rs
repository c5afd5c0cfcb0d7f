//! Embedded engine adapter.
//!
//! Wraps an in-memory SQLite connection. The whole database can be exported
//! to, or rebuilt from, the native SQLite file image; both directions go
//! through the online-backup API via a temporary file.
//!
//! Every connection runs with `foreign_keys` off: references are declared in
//! the schema but only checked on demand with `PRAGMA foreign_key_check`.

use std::io::Write;

use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Per-connection settings. The bundled SQLite enables foreign keys by
/// default, and a restore does not carry pragmas over, so this runs on
/// every connection the engine opens.
fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    conn.pragma_update(None, "temp_store", "MEMORY")
}

/// An in-memory SQLite database.
#[derive(Debug)]
pub struct Engine {
    conn: Connection,
}

impl Engine {
    /// Create an empty in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `EngineInit` if SQLite cannot open a connection.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::EngineInit(e.to_string()))?;
        configure(&conn).map_err(|e| Error::EngineInit(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Rebuild a database from a native SQLite file image.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable SQLite database.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut staged = NamedTempFile::new()?;
        staged.write_all(bytes)?;
        staged.flush()?;

        let mut engine = Self::open_in_memory()?;
        engine
            .conn
            .restore(DatabaseName::Main, staged.path(), None::<fn(Progress)>)?;

        // Force a read so a garbage image fails here rather than later
        engine
            .conn
            .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
        configure(&engine.conn)?;

        debug!(bytes = bytes.len(), "Engine restored from image");
        Ok(engine)
    }

    /// Export the native SQLite file image.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup or the temporary file fails.
    pub fn export(&self) -> Result<Vec<u8>> {
        let staged = NamedTempFile::new()?;
        self.conn.backup(DatabaseName::Main, staged.path(), None)?;
        let bytes = std::fs::read(staged.path())?;
        debug!(bytes = bytes.len(), "Engine exported");
        Ok(bytes)
    }

    /// Execute one or more raw SQL statements.
    ///
    /// # Errors
    ///
    /// Returns the first statement error.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any close error.
    ///
    /// # Errors
    ///
    /// Returns the SQLite error if the connection could not be closed.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_import_round_trip() {
        let engine = Engine::open_in_memory().unwrap();
        engine
            .execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (2), (3);")
            .unwrap();

        let bytes = engine.export().unwrap();
        assert!(bytes.starts_with(b"SQLite format 3\0"));

        let restored = Engine::from_bytes(&bytes).unwrap();
        let n: i64 = restored
            .conn()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 3);
        restored.close().unwrap();
    }

    fn foreign_keys(engine: &Engine) -> i64 {
        engine
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_foreign_keys_off_after_restore() {
        let engine = Engine::open_in_memory().unwrap();
        assert_eq!(foreign_keys(&engine), 0);
        engine
            .execute_batch(
                "CREATE TABLE parent (id TEXT PRIMARY KEY);
                 CREATE TABLE child (parent_id TEXT REFERENCES parent(id));
                 INSERT INTO parent VALUES ('p1');
                 INSERT INTO child VALUES ('p1');",
            )
            .unwrap();

        let restored = Engine::from_bytes(&engine.export().unwrap()).unwrap();
        assert_eq!(foreign_keys(&restored), 0);

        // Deleting a referenced parent is allowed; the orphan is left for the check
        restored.execute_batch("DELETE FROM parent WHERE id = 'p1'").unwrap();
        let mut check = restored.conn().prepare("PRAGMA foreign_key_check").unwrap();
        let orphans = check.query_map([], |row| row.get::<_, String>(0)).unwrap().count();
        assert_eq!(orphans, 1);
    }

    #[test]
    fn test_garbage_image_is_rejected() {
        let garbage = b"definitely not a sqlite database, just some bytes padding it out".repeat(32);
        assert!(Engine::from_bytes(&garbage).is_err());
    }
}
