// 📤 Spreadsheet rows + CSV export/import
// Column order matches the expense table:
//   ID | EmployeeName | EmployeeEmail | ExpenseDate | Amount | Category | ReceiptURL | Status

use crate::error::{ExpenseError, Result};
use crate::models::{midnight_utc, ExpenseRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of the expense table, as the spreadsheet stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetRow {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "EmployeeName")]
    pub employee_name: String,

    #[serde(rename = "EmployeeEmail")]
    pub employee_email: String,

    /// YYYY-MM-DD
    #[serde(rename = "ExpenseDate")]
    pub expense_date: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "ReceiptURL")]
    pub receipt_url: String,

    #[serde(rename = "Status")]
    pub status: String,
}

impl From<&ExpenseRecord> for SpreadsheetRow {
    fn from(record: &ExpenseRecord) -> Self {
        SpreadsheetRow {
            id: record.id.clone(),
            employee_name: record.employee_name.clone(),
            employee_email: record.employee_email.clone(),
            expense_date: record.expense_date.format(DATE_FORMAT).to_string(),
            amount: record.amount,
            category: record.category.clone(),
            receipt_url: record.receipt_url.clone(),
            status: record.status.as_str().to_string(),
        }
    }
}

impl TryFrom<SpreadsheetRow> for ExpenseRecord {
    type Error = ExpenseError;

    /// The table has no file-name or submission columns: the file name is the
    /// last segment of the receipt URL and submission is taken as midnight UTC
    /// of the expense date.
    fn try_from(row: SpreadsheetRow) -> Result<Self> {
        let expense_date = NaiveDate::parse_from_str(&row.expense_date, DATE_FORMAT).map_err(|e| {
            ExpenseError::invalid_input(format!(
                "Row {}: bad ExpenseDate '{}': {}",
                row.id, row.expense_date, e
            ))
        })?;
        if row.amount < 0.0 {
            return Err(ExpenseError::invalid_input(format!(
                "Row {}: Amount must not be negative",
                row.id
            )));
        }
        let status = row.status.parse()?;
        let receipt_file_name = row
            .receipt_url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Ok(ExpenseRecord {
            id: row.id,
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            expense_date,
            amount: row.amount,
            category: row.category,
            receipt_file_name,
            receipt_url: row.receipt_url,
            status,
            submission_date: midnight_utc(expense_date),
        })
    }
}

pub fn write_csv<W: Write>(writer: W, records: &[ExpenseRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(SpreadsheetRow::from(record))?;
    }
    if records.is_empty() {
        // serialize() emits the header with the first row only
        wtr.write_record([
            "ID",
            "EmployeeName",
            "EmployeeEmail",
            "ExpenseDate",
            "Amount",
            "Category",
            "ReceiptURL",
            "Status",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let row: SpreadsheetRow = row?;
        records.push(ExpenseRecord::try_from(row)?);
    }
    Ok(records)
}

pub fn export_csv(path: &Path, records: &[ExpenseRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, records)
}

pub fn import_csv(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}
