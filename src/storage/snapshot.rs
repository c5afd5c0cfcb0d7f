//! Snapshot persistence.
//!
//! The full database image is base64-encoded and written under one key of a
//! [`KeyValueStore`]; the schema version of that save goes under a companion
//! key. Loading absorbs decode and restore failures: a corrupt snapshot reads
//! as "no existing database" so the caller can start fresh.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{error, info, warn};

use super::engine::Engine;
use super::kv::KeyValueStore;
use super::schema::{schema_version, SCHEMA_VERSION};
use crate::config::StorageKeys;
use crate::error::Result;

/// Encode a database image for the text store.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a stored snapshot back into a database image.
///
/// # Errors
///
/// Returns `Decode` if the text is not valid base64.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

/// Export `engine` and write it to `store`.
///
/// # Errors
///
/// Returns `QuotaExceeded` when the store is full (the in-memory database is
/// untouched), or another error if export or the write fails.
pub fn save(engine: &Engine, store: &dyn KeyValueStore, keys: &StorageKeys) -> Result<()> {
    let bytes = engine.export()?;
    let encoded = encode(&bytes);

    if let Err(e) = store.set(&keys.database, &encoded) {
        let err = crate::error::Error::from(e);
        if err.is_quota_exceeded() {
            error!(bytes = encoded.len(), "Storage quota exceeded, database not persisted");
        }
        return Err(err);
    }
    store.set(&keys.version, &SCHEMA_VERSION.to_string())?;

    info!(bytes = bytes.len(), "Database saved");
    Ok(())
}

/// Load the stored snapshot, if there is a usable one.
///
/// A missing or empty value, invalid base64, or an image SQLite cannot open
/// all yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error only if the store itself cannot be read.
pub fn load(store: &dyn KeyValueStore, keys: &StorageKeys) -> Result<Option<Engine>> {
    let Some(text) = store.get(&keys.database)? else {
        return Ok(None);
    };
    if text.trim().is_empty() {
        return Ok(None);
    }

    let bytes = match decode(&text) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Stored database is not valid base64, starting fresh");
            return Ok(None);
        }
    };

    let engine = match Engine::from_bytes(&bytes) {
        Ok(engine) => engine,
        Err(e) => {
            warn!(error = %e, "Stored database could not be opened, starting fresh");
            return Ok(None);
        }
    };

    let embedded = schema_version(engine.conn());
    if embedded < SCHEMA_VERSION {
        warn!(
            stored = embedded,
            current = SCHEMA_VERSION,
            "Stored database has an older schema version"
        );
    }
    match stored_version(store, keys) {
        Ok(Some(recorded)) if recorded != embedded => {
            warn!(recorded, embedded, "Stored version key disagrees with the database image");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Could not read stored version key"),
    }

    info!(bytes = bytes.len(), version = embedded, "Database loaded from snapshot");
    Ok(Some(engine))
}

/// Schema version recorded by the last save.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn stored_version(store: &dyn KeyValueStore, keys: &StorageKeys) -> Result<Option<i64>> {
    Ok(store
        .get(&keys.version)?
        .and_then(|v| v.trim().parse().ok()))
}

/// Remove both snapshot keys.
///
/// # Errors
///
/// Returns an error if the store cannot be modified.
pub fn clear(store: &dyn KeyValueStore, keys: &StorageKeys) -> Result<()> {
    store.remove(&keys.database)?;
    store.remove(&keys.version)?;
    Ok(())
}
