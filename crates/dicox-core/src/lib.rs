//! Dicox Core Library
//!
//! Receipt sequencing and study record store for diagnostic billing.
//!
//! # Architecture
//!
//! ```text
//! HTTP layer (external) ──► StudyService ──► Database (SQLite)
//!                                │
//!                     ┌──────────┴──────────┐
//!                     │                     │
//!                 Sequencer            Record Store
//!            counters(next_receipt)      studies
//! ```
//!
//! # Core Principle
//!
//! **A receipt number is issued exactly once.** The counter advance is a
//! single committed transaction; concurrent callers never observe the same
//! value, and a crash between issuance and record persistence leaves a gap
//! in the sequence rather than a reusable number.
//!
//! # Modules
//!
//! - [`db`]: SQLite storage layer (sequencer + study operations)
//! - [`models`]: Domain types (StudyRecord, NewStudy, HealthSnapshot, ...)

pub mod db;
pub mod models;

// Re-export commonly used types
pub use db::{Database, DbResult, StoreError};
pub use models::{
    HealthSnapshot, NewStudy, StudyRecord, StudyStatus, StudyUpdate, DEFAULT_INSTITUTION,
};

use std::path::Path;
use std::sync::{Arc, Mutex};

/// Thread-safe service facade over the store.
///
/// Clones share one underlying connection; in-process callers serialize
/// through the mutex, while contention from other connections on the same
/// file is absorbed by the sequencer's retry loop.
#[derive(Clone)]
pub struct StudyService {
    db: Arc<Mutex<Database>>,
}

impl StudyService {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = Database::open(path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Peek at the next receipt number without consuming it.
    pub fn next_receipt_preview(&self) -> DbResult<u64> {
        let db = self.db.lock()?;
        db.peek_receipt()
    }

    /// Create a study, stamping it with the next receipt number.
    pub fn create_study(&self, input: &NewStudy) -> DbResult<StudyRecord> {
        let mut db = self.db.lock()?;
        db.create_study(input)
    }

    /// Get a study by id.
    pub fn get_study(&self, id: i64) -> DbResult<Option<StudyRecord>> {
        let db = self.db.lock()?;
        db.get_study(id)
    }

    /// List unprocessed studies, most-recently-created first.
    pub fn list_pending_studies(&self) -> DbResult<Vec<StudyRecord>> {
        let db = self.db.lock()?;
        db.list_pending_studies()
    }

    /// List every study.
    pub fn list_studies(&self) -> DbResult<Vec<StudyRecord>> {
        let db = self.db.lock()?;
        db.list_studies()
    }

    /// Mark a study as processed. Idempotent.
    pub fn mark_processed(&self, id: i64) -> DbResult<()> {
        let db = self.db.lock()?;
        db.mark_processed(id)
    }

    /// Mark several studies as processed; returns the number touched.
    pub fn mark_processed_many(&self, ids: &[i64]) -> DbResult<usize> {
        let db = self.db.lock()?;
        db.mark_processed_many(ids)
    }

    /// Overwrite a study's mutable business fields.
    pub fn update_study(&self, id: i64, fields: &StudyUpdate) -> DbResult<()> {
        let db = self.db.lock()?;
        db.update_study(id, fields)
    }

    /// Annul a study (terminal; zeroes the amount). Idempotent.
    pub fn annul_study(&self, id: i64) -> DbResult<()> {
        let db = self.db.lock()?;
        db.annul_study(id)
    }

    /// Read-only store summary.
    pub fn health_snapshot(&self) -> DbResult<HealthSnapshot> {
        let db = self.db.lock()?;
        db.health_snapshot()
    }
}
