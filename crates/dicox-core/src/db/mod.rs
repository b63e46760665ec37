//! Database layer for dicox.

mod schema;
mod sequencer;
mod studies;

pub use schema::*;
pub use sequencer::*;
#[allow(unused_imports)]
pub use studies::*;

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How long a statement waits on another connection's lock before
/// reporting busy. The sequencer's retry loop sits on top of this.
const BUSY_TIMEOUT: Duration = Duration::from_millis(500);

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("record not found: {0}")]
    NotFound(String),

    /// Transient: the store stayed locked through every retry attempt.
    /// Safe to retry the whole operation; no value was issued.
    #[error("store busy after {0} attempts")]
    Busy(u32),

    /// Fatal: the counter row is missing after schema initialization.
    #[error("counter row missing for key '{0}'")]
    CounterMissing(String),

    #[error("connection lock poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

pub type DbResult<T> = Result<T, StoreError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Whether an error is SQLite reporting lock contention.
pub(crate) fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    )
}
