pub mod records;
pub mod tables;
pub mod users;

use redb::{Database, Error as RedbError, ReadableTable, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Value type of the serialized tables
pub(crate) type Bytes = &'static [u8];

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create every table so read transactions never hit a missing one
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> std::result::Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::USERNAMES)?;
        let _ = write_txn.open_table(tables::EMAILS)?;
        let _ = write_txn.open_table(tables::SEQUENCES)?;
        let _ = write_txn.open_table(tables::HEALTH_RECORDS)?;
        let _ = write_txn.open_table(tables::VITAL_SIGNS)?;
        let _ = write_txn.open_table(tables::USER_RECORDS)?;
        let _ = write_txn.open_table(tables::RECORD_VITALS)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Issue the next id from `sequence`. Ids start at 1 and are never reused.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut table = txn.open_table(tables::SEQUENCES)?;
    let next = table.get(sequence)?.map(|g| g.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Read a serialized id list (owner index entry); missing means empty
pub(crate) fn load_ids<T: ReadableTable<u64, Bytes>>(table: &T, key: u64) -> Result<Vec<u64>> {
    table
        .get(key)?
        .map(|g| decode(g.value()))
        .transpose()
        .map(Option::unwrap_or_default)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh database in a temp dir; keep the TempDir alive for the test's duration
    pub fn temp_db() -> (TempDir, Db) {
        let dir = TempDir::new().unwrap();
        let db = open_database(dir.path().join("test.redb")).unwrap();
        (dir, db)
    }
}
