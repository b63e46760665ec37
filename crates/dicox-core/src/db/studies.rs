//! Study record operations.

use chrono::{Local, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult, StoreError};
use crate::models::{
    HealthSnapshot, NewStudy, StudyRecord, StudyStatus, StudyUpdate, DEFAULT_INSTITUTION,
};

const STUDY_COLUMNS: &str = "id, patient_name, description, receipt_number, institution, \
     client, payment_method, approval_number, date, amount, status, processed, created_at";

impl Database {
    /// Create a study, consuming exactly one receipt number.
    ///
    /// Validation runs before the counter is touched, so rejected input
    /// never burns a number. The counter advance commits on its own; a
    /// failed insert afterwards leaves a gap in the sequence, never a
    /// duplicate.
    pub fn create_study(&mut self, input: &NewStudy) -> DbResult<StudyRecord> {
        validate_required(&input.patient_name, &input.description)?;

        let receipt_number = self.next_receipt()?.to_string();
        let record = StudyRecord {
            id: 0, // assigned by the store below
            patient_name: input.patient_name.clone(),
            description: input.description.clone(),
            receipt_number,
            institution: non_empty_or(&input.institution, DEFAULT_INSTITUTION),
            client: non_empty_or(&input.client, ""),
            payment_method: non_empty_or(&input.payment_method, ""),
            approval_number: non_empty_or(&input.approval_number, ""),
            date: input
                .date
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string()),
            amount: non_empty_or(&input.amount, "0"),
            status: StudyStatus::Paid,
            processed: false,
            created_at: Utc::now().to_rfc3339(),
        };

        self.conn.execute(
            r#"
            INSERT INTO studies (
                patient_name, description, receipt_number, institution,
                client, payment_method, approval_number, date, amount,
                status, processed, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                record.patient_name,
                record.description,
                record.receipt_number,
                record.institution,
                record.client,
                record.payment_method,
                record.approval_number,
                record.date,
                record.amount,
                status_to_string(&record.status),
                record.processed,
                record.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        tracing::debug!(id, receipt = %record.receipt_number, "study created");
        Ok(StudyRecord { id, ..record })
    }

    /// Get a study by id.
    pub fn get_study(&self, id: i64) -> DbResult<Option<StudyRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {STUDY_COLUMNS} FROM studies WHERE id = ?"),
                [id],
                map_study_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List unprocessed studies, most-recently-created first.
    pub fn list_pending_studies(&self) -> DbResult<Vec<StudyRecord>> {
        self.query_studies(&format!(
            "SELECT {STUDY_COLUMNS} FROM studies WHERE processed = 0 ORDER BY id DESC"
        ))
    }

    /// List every study regardless of processing state.
    pub fn list_studies(&self) -> DbResult<Vec<StudyRecord>> {
        self.query_studies(&format!(
            "SELECT {STUDY_COLUMNS} FROM studies ORDER BY id DESC"
        ))
    }

    /// Mark a study as processed. Idempotent.
    pub fn mark_processed(&self, id: i64) -> DbResult<()> {
        let rows_affected = self
            .conn
            .execute("UPDATE studies SET processed = 1 WHERE id = ?", [id])?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("study {id}")));
        }
        tracing::debug!(id, "study marked processed");
        Ok(())
    }

    /// Mark several studies as processed, skipping absent ids.
    /// Returns the number of rows touched.
    pub fn mark_processed_many(&self, ids: &[i64]) -> DbResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("UPDATE studies SET processed = 1 WHERE id IN ({placeholders})");
        let rows_affected = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(ids.iter()))?;
        Ok(rows_affected)
    }

    /// Overwrite a study's mutable business fields.
    ///
    /// `id`, `receipt_number` and `created_at` never change; `status` and
    /// `processed` move only through their dedicated transitions.
    pub fn update_study(&self, id: i64, fields: &StudyUpdate) -> DbResult<()> {
        validate_required(&fields.patient_name, &fields.description)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE studies SET
                patient_name = ?2,
                description = ?3,
                institution = ?4,
                client = ?5,
                payment_method = ?6,
                approval_number = ?7,
                date = ?8,
                amount = ?9
            WHERE id = ?1
            "#,
            params![
                id,
                fields.patient_name,
                fields.description,
                fields.institution,
                fields.client,
                fields.payment_method,
                fields.approval_number,
                fields.date,
                fields.amount,
            ],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("study {id}")));
        }
        Ok(())
    }

    /// Annul a study: status becomes terminal and the amount is zeroed.
    /// Idempotent.
    pub fn annul_study(&self, id: i64) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE studies SET status = 'annulled', amount = '0' WHERE id = ?",
            [id],
        )?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("study {id}")));
        }
        tracing::debug!(id, "study annulled");
        Ok(())
    }

    /// Read-only store summary: record counts and the counter's value.
    pub fn health_snapshot(&self) -> DbResult<HealthSnapshot> {
        let total: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM studies", [], |row| row.get(0))?;
        let pending: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM studies WHERE processed = 0",
            [],
            |row| row.get(0),
        )?;
        let next_receipt = self.peek_receipt()?;

        Ok(HealthSnapshot {
            total,
            pending,
            next_receipt,
        })
    }

    fn query_studies(&self, sql: &str) -> DbResult<Vec<StudyRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map_study_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn map_study_row(row: &Row<'_>) -> rusqlite::Result<StudyRecord> {
    let status: String = row.get(10)?;
    Ok(StudyRecord {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        description: row.get(2)?,
        receipt_number: row.get(3)?,
        institution: row.get(4)?,
        client: row.get(5)?,
        payment_method: row.get(6)?,
        approval_number: row.get(7)?,
        date: row.get(8)?,
        amount: row.get(9)?,
        status: string_to_status(&status).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })?,
        processed: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn validate_required(patient_name: &str, description: &str) -> DbResult<()> {
    if patient_name.trim().is_empty() {
        return Err(StoreError::Validation("patient_name must not be empty".into()));
    }
    if description.trim().is_empty() {
        return Err(StoreError::Validation("description must not be empty".into()));
    }
    Ok(())
}

fn non_empty_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| default.to_owned())
}

fn status_to_string(status: &StudyStatus) -> &'static str {
    match status {
        StudyStatus::Paid => "paid",
        StudyStatus::Annulled => "annulled",
    }
}

fn string_to_status(s: &str) -> Result<StudyStatus, std::io::Error> {
    match s {
        "paid" => Ok(StudyStatus::Paid),
        "annulled" => Ok(StudyStatus::Annulled),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unknown study status: {s}"),
        )),
    }
}
