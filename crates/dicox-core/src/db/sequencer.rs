//! Receipt counter operations.
//!
//! The counter is the single source of truth for receipt numbers. Each
//! advance runs as one `BEGIN IMMEDIATE` transaction (write lock taken up
//! front), so two connections can never both observe the same pre-increment
//! value. When another connection holds the lock, SQLite reports busy and
//! the whole attempt is retried with bounded exponential backoff.

use std::thread;
use std::time::Duration;

use rusqlite::{OptionalExtension, TransactionBehavior};

use super::{is_busy, Database, DbResult, StoreError};

/// Key of the receipt sequence in the `counters` table.
pub const RECEIPT_COUNTER_KEY: &str = "next_receipt";

const MAX_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(25);

impl Database {
    /// Issue the next receipt number, durably committed before return.
    ///
    /// The returned value is never handed to any other caller. The commit
    /// happens here, independently of whatever the caller does next: if a
    /// subsequent record insert fails, the sequence keeps a gap rather than
    /// ever reissuing the number.
    pub fn next_receipt(&mut self) -> DbResult<u64> {
        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.advance_counter() {
                Ok(value) => return Ok(value),
                Err(StoreError::Sqlite(err)) if is_busy(&err) => {
                    if attempt == MAX_ATTEMPTS {
                        return Err(StoreError::Busy(MAX_ATTEMPTS));
                    }
                    tracing::warn!(attempt, ?backoff, "receipt counter busy, retrying");
                    thread::sleep(backoff);
                    backoff *= 2;
                }
                Err(err) => return Err(err),
            }
        }
        unreachable!("retry loop returns on the final attempt")
    }

    /// Read the counter's current value without consuming it.
    pub fn peek_receipt(&self) -> DbResult<u64> {
        self.conn
            .query_row(
                "SELECT value FROM counters WHERE key = ?",
                [RECEIPT_COUNTER_KEY],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::CounterMissing(RECEIPT_COUNTER_KEY.into()))
    }

    /// One atomic read-update-commit of the counter row.
    fn advance_counter(&mut self) -> DbResult<u64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let value: Option<u64> = tx
            .query_row(
                "SELECT value FROM counters WHERE key = ?",
                [RECEIPT_COUNTER_KEY],
                |row| row.get(0),
            )
            .optional()?;
        let value = value.ok_or_else(|| StoreError::CounterMissing(RECEIPT_COUNTER_KEY.into()))?;

        tx.execute(
            "UPDATE counters SET value = value + 1 WHERE key = ?",
            [RECEIPT_COUNTER_KEY],
        )?;
        tx.commit()?;

        Ok(value)
    }
}
