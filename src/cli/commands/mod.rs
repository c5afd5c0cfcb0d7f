//! Command implementations.

pub mod init;
pub mod inspect;
pub mod migrate;
pub mod transfer;

use std::path::Path;

use crate::config::{resolve_data_dir, store_dir, OpenOptions, DB_STORAGE_KEY};
use crate::error::{Error, Result};
use crate::storage::{FileStore, KeyValueStore, SqliteStorage};

/// Open the database kept under the data directory.
///
/// Only `init` may create a database; every other command fails when the
/// store holds no snapshot.
pub(crate) fn open_storage(data_dir: Option<&Path>, options: OpenOptions) -> Result<SqliteStorage> {
    let dir = store_dir(&resolve_data_dir(data_dir)?);
    let store = FileStore::open(&dir)?;

    if store.get(DB_STORAGE_KEY)?.is_none() {
        return Err(Error::Config(format!(
            "no database in {} (run `crm init` first)",
            dir.display()
        )));
    }

    SqliteStorage::open(Box::new(store), options)
}
