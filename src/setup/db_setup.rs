use crate::models::db_operations::videos_db_operations::{BY_EDITOR, BY_UPLOADED_FOR, BY_UPLOADER, VIDEOS};
use redb::{CommitError, Database, StorageError, TableError, TransactionError};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
}

pub fn setup_users_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    log::debug!("Creating 'users' table");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('creator', 'editor')),
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)", [])?;
    tx.commit()?;
    Ok(())
}

/// Creates the video document table and its three lookup indexes. Opening a
/// table in a write transaction is what creates it in redb.
pub fn setup_videos_db(db: &Database) -> Result<(), SetupError> {
    let write_txn = db.begin_write()?;
    {
        log::debug!("Creating 'videos' table");
        write_txn.open_table(VIDEOS)?;
        log::debug!("Creating video index tables");
        write_txn.open_table(BY_UPLOADER)?;
        write_txn.open_table(BY_UPLOADED_FOR)?;
        write_txn.open_table(BY_EDITOR)?;
    }
    write_txn.commit()?;
    Ok(())
}
