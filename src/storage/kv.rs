//! Durable key-value stores that hold database snapshots.
//!
//! The snapshot layer only needs string get/set/remove. Two backends:
//!
//! - [`MemoryStore`]: process-local map with an optional byte quota
//! - [`FileStore`]: one file per key in a directory, written atomically
//!
//! Both report a full store as [`StoreError::QuotaExceeded`], kept distinct
//! from other I/O failures so callers can tell the user what to do.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by a key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Quota exceeded writing '{key}' ({requested} bytes, limit {limit} bytes)")]
    QuotaExceeded {
        key: String,
        limit: u64,
        requested: u64,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// String key-value storage.
pub trait KeyValueStore {
    /// Read a key; `None` when it was never written or has been removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `QuotaExceeded` when the store is full.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

fn byte_len(s: &str) -> u64 {
    u64::try_from(s.len()).unwrap_or(u64::MAX)
}

// ── MemoryStore ──────────────────────────────────────────────

/// In-process store. Total bytes across keys and values count toward the
/// quota, when one is set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    quota: Option<u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses writes once total usage would exceed `bytes`.
    #[must_use]
    pub fn with_quota(bytes: u64) -> Self {
        Self {
            entries: RefCell::default(),
            quota: Some(bytes),
        }
    }

    /// Bytes currently used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| byte_len(k) + byte_len(v))
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(limit) = self.quota {
            let existing = self
                .entries
                .borrow()
                .get(key)
                .map_or(0, |v| byte_len(key) + byte_len(v));
            let requested = self.used_bytes() - existing + byte_len(key) + byte_len(value);
            if requested > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    limit,
                    requested,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

// ── FileStore ────────────────────────────────────────────────

/// Directory-backed store: each key is a file named after the key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            quota: None,
        })
    }

    /// Limit the total size of all key files.
    #[must_use]
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }

    /// Bytes used by every key file except `skip`. Dot files are in-flight
    /// temp files and never keys.
    fn used_bytes_except(&self, skip: &Path) -> StoreResult<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            total += entry.metadata()?.len();
        }
        Ok(total)
    }
}

/// Sibling temp file for `path`: `.<file name>.tmp`. Keys never start with
/// a dot, so this cannot name another key.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = path.file_name() {
        name.push(file_name);
    }
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `content` to `path` atomically: temp file, fsync, rename.
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let temp_path = temp_path_for(path);

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;

        if let Some(limit) = self.quota {
            let requested = self.used_bytes_except(&path)? + byte_len(value);
            if requested > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    limit,
                    requested,
                });
            }
        }

        atomic_write(&path, value).map_err(|e| {
            let _ = fs::remove_file(temp_path_for(&path));
            if e.kind() == ErrorKind::StorageFull {
                StoreError::QuotaExceeded {
                    key: key.to_string(),
                    limit: self.quota.unwrap_or(0),
                    requested: byte_len(value),
                }
            } else {
                StoreError::Io(e)
            }
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_basics() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();
        // Replacing a value only counts the new size
        store.set("k", "123456789").unwrap();

        let err = store.set("other", "123456").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(&temp.path().join("store")).unwrap();

        assert_eq!(store.get("agentic_crm_database").unwrap(), None);
        store.set("agentic_crm_database", "abc").unwrap();
        assert_eq!(
            store.get("agentic_crm_database").unwrap().as_deref(),
            Some("abc")
        );

        // Survives reopening
        let reopened = FileStore::open(store.dir()).unwrap();
        assert_eq!(
            reopened.get("agentic_crm_database").unwrap().as_deref(),
            Some("abc")
        );

        reopened.remove("agentic_crm_database").unwrap();
        assert_eq!(store.get("agentic_crm_database").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_file_store_quota() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap().with_quota(8);
        store.set("a", "1234").unwrap();
        store.set("a", "12345678").unwrap();

        let err = store.set("b", "1").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_file_store_dotted_keys() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap().with_quota(12);

        store.set("db.main", "1111").unwrap();
        store.set("db.backup", "2222").unwrap();
        store.set("db.tmp", "3333").unwrap();
        assert_eq!(store.get("db.main").unwrap().as_deref(), Some("1111"));
        assert_eq!(store.get("db.backup").unwrap().as_deref(), Some("2222"));
        assert_eq!(store.get("db.tmp").unwrap().as_deref(), Some("3333"));

        // All three count against the quota, `db.tmp` included
        let err = store.set("db", "4").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { requested: 13, .. }));

        // Only key files are left behind
        let mut names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["db.backup", "db.main", "db.tmp"]);
    }
}
