//! SQLite schema definition.

/// Complete database schema for dicox.
///
/// The batch is idempotent: tables are created `IF NOT EXISTS` and the
/// receipt counter is seeded with `INSERT OR IGNORE`, so concurrent
/// first-time startups never race to create duplicate counters.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Counters (one row per named sequence)
-- ============================================================================

CREATE TABLE IF NOT EXISTS counters (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);

-- Seed the receipt sequence at 1
INSERT OR IGNORE INTO counters (key, value) VALUES ('next_receipt', 1);

-- ============================================================================
-- Studies
-- ============================================================================

CREATE TABLE IF NOT EXISTS studies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_name TEXT NOT NULL,
    description TEXT NOT NULL,
    receipt_number TEXT NOT NULL UNIQUE,
    institution TEXT NOT NULL DEFAULT 'REMadom',
    client TEXT NOT NULL DEFAULT '',
    payment_method TEXT NOT NULL DEFAULT '',
    approval_number TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL DEFAULT '',
    amount TEXT NOT NULL DEFAULT '0',
    status TEXT NOT NULL DEFAULT 'paid' CHECK (status IN ('paid', 'annulled')),
    processed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_studies_processed ON studies(processed);
"#;
