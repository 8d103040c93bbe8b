// 🧾 Expense data model
// One submitted reimbursement claim + the result of submitting it

use crate::error::{ExpenseError, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STATUS
// ============================================================================

/// Approval state. The wire vocabulary is exactly these three literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Pending => "Pending",
            ExpenseStatus::Approved => "Approved",
            ExpenseStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExpenseStatus::Pending)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseStatus {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Pending" => Ok(ExpenseStatus::Pending),
            "Approved" => Ok(ExpenseStatus::Approved),
            "Rejected" => Ok(ExpenseStatus::Rejected),
            other => Err(ExpenseError::invalid_input(format!(
                "Unknown expense status '{}'. Expected Pending, Approved or Rejected.",
                other
            ))),
        }
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// Expense record as stored in the expense table.
///
/// Identity: `id` (`EXP-<timestamp>-<random>`), never changes after creation.
/// Only `status` is mutated, through the store's status update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,

    pub employee_name: String,
    pub employee_email: String,

    /// When the expense occurred
    pub expense_date: NaiveDate,
    pub amount: f64,
    /// Free-form, usually one of the form's category keys
    pub category: String,

    pub receipt_file_name: String,
    /// Location reference returned by the receipt uploader
    #[serde(rename = "receiptURL")]
    pub receipt_url: String,

    pub status: ExpenseStatus,
    pub submission_date: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Demonstration rows the simulated table starts with when seeded.
    pub fn sample_records() -> Vec<ExpenseRecord> {
        vec![
            ExpenseRecord {
                id: "EXP-001".to_string(),
                employee_name: "John Doe".to_string(),
                employee_email: "john@example.com".to_string(),
                expense_date: date(2024, 10, 20),
                amount: 150.00,
                category: "Travel".to_string(),
                receipt_file_name: "receipt_001.pdf".to_string(),
                receipt_url: "/sites/test/Receipts/receipt_001.pdf".to_string(),
                status: ExpenseStatus::Pending,
                submission_date: midnight_utc(date(2024, 10, 20)),
            },
            ExpenseRecord {
                id: "EXP-002".to_string(),
                employee_name: "Jane Smith".to_string(),
                employee_email: "jane@example.com".to_string(),
                expense_date: date(2024, 10, 21),
                amount: 45.50,
                category: "Food".to_string(),
                receipt_file_name: "receipt_002.jpg".to_string(),
                receipt_url: "/sites/test/Receipts/receipt_002.jpg".to_string(),
                status: ExpenseStatus::Approved,
                submission_date: midnight_utc(date(2024, 10, 21)),
            },
        ]
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub(crate) fn midnight_utc(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::default()))
}

// ============================================================================
// SUBMISSION OUTCOME
// ============================================================================

/// Result of one submission attempt. Shown to the user, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(message: impl Into<String>, expense_id: impl Into<String>) -> Self {
        SubmissionOutcome {
            success: true,
            message: message.into(),
            expense_id: Some(expense_id.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        SubmissionOutcome {
            success: false,
            message: message.into(),
            expense_id: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// RECEIPT FILE
// ============================================================================

/// File handed to the uploader: name, size in bytes and MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl ReceiptFile {
    pub fn new(name: &str, size: u64, mime_type: &str) -> Self {
        ReceiptFile {
            name: name.to_string(),
            size,
            mime_type: mime_type.to_string(),
        }
    }

    /// Text after the last '.', or the whole name when there is no dot
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}
