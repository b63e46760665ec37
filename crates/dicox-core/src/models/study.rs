//! Study record models.

use serde::{Deserialize, Serialize};

/// Institutional name stamped on records when the caller provides none.
pub const DEFAULT_INSTITUTION: &str = "REMadom";

/// Billing status of a study.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StudyStatus {
    /// Normal billed state
    Paid,
    /// Voided; amount is zeroed and the state is terminal
    Annulled,
}

/// A billed diagnostic study, stamped with a unique receipt number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyRecord {
    /// Store-assigned id, immutable
    pub id: i64,
    /// Patient full name
    pub patient_name: String,
    /// Study description
    pub description: String,
    /// Sequential receipt number, unique across all records, immutable
    pub receipt_number: String,
    /// Billing institution
    pub institution: String,
    /// Client/payer name
    pub client: String,
    /// Payment method
    pub payment_method: String,
    /// Insurance approval number
    pub approval_number: String,
    /// Study date (YYYY-MM-DD)
    pub date: String,
    /// Billed amount, carried as a decimal string
    pub amount: String,
    /// Billing status
    pub status: StudyStatus,
    /// Whether the record has been picked up by downstream processing
    pub processed: bool,
    /// Creation timestamp, immutable
    pub created_at: String,
}

/// Input for creating a study. Optional fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStudy {
    pub patient_name: String,
    pub description: String,
    pub institution: Option<String>,
    pub client: Option<String>,
    pub payment_method: Option<String>,
    pub approval_number: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
}

impl NewStudy {
    /// Create an input with the required fields set.
    pub fn new(patient_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            patient_name: patient_name.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

/// Full overwrite of a study's mutable business fields.
///
/// `status` and `processed` are excluded: they change only through their
/// dedicated transitions (annul, mark processed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyUpdate {
    pub patient_name: String,
    pub description: String,
    pub institution: String,
    pub client: String,
    pub payment_method: String,
    pub approval_number: String,
    pub date: String,
    pub amount: String,
}

impl From<&StudyRecord> for StudyUpdate {
    fn from(record: &StudyRecord) -> Self {
        Self {
            patient_name: record.patient_name.clone(),
            description: record.description.clone(),
            institution: record.institution.clone(),
            client: record.client.clone(),
            payment_method: record.payment_method.clone(),
            approval_number: record.approval_number.clone(),
            date: record.date.clone(),
            amount: record.amount.clone(),
        }
    }
}

/// Read-only store summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthSnapshot {
    /// Total number of study records
    pub total: u64,
    /// Records with `processed = false`
    pub pending: u64,
    /// The counter's current value (the next receipt to be issued)
    pub next_receipt: u64,
}
