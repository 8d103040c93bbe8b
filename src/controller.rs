// 📝 Form Controller
// Field validation + the submission sequence:
//   generate id → validate receipt → upload → build record → add → outcome

use crate::config::Settings;
use crate::models::{ExpenseRecord, ExpenseStatus, ReceiptFile, SubmissionOutcome};
use crate::store::{ExpenseStore, SimulatedExpenseBackend};
use crate::uploader::ReceiptUploader;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use tracing::{error, info};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub const GENERIC_FAILURE_MESSAGE: &str = "Error submitting expense. Please try again.";

// ============================================================================
// CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub key: &'static str,
    pub text: &'static str,
}

pub const CATEGORY_OPTIONS: &[CategoryOption] = &[
    CategoryOption { key: "travel", text: "Travel" },
    CategoryOption { key: "food", text: "Food & Dining" },
    CategoryOption { key: "office", text: "Office Supplies" },
    CategoryOption { key: "equipment", text: "Equipment" },
    CategoryOption { key: "software", text: "Software/Subscriptions" },
    CategoryOption { key: "other", text: "Other" },
];

// ============================================================================
// FORM
// ============================================================================

/// Form state as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseForm {
    pub employee_name: String,
    pub employee_email: String,
    pub expense_date: Option<NaiveDate>,
    /// Raw text, parsed on validation
    pub amount: String,
    pub category: String,
    pub receipt: Option<ReceiptFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormValidationError {
    pub field: String,
    pub message: String,
}

impl FormValidationError {
    fn new(field: &str, message: &str) -> Self {
        FormValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for FormValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FormValidationError {}

/// A form that passed validation, with fields trimmed and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub employee_name: String,
    pub employee_email: String,
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub receipt: ReceiptFile,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

impl ExpenseForm {
    /// First failing field wins, in form order.
    pub fn validate(&self) -> Result<ValidatedForm, FormValidationError> {
        let name = self.employee_name.trim();
        if name.is_empty() {
            return Err(FormValidationError::new("employeeName", "Please enter your name"));
        }

        let email = self.employee_email.trim();
        if email.is_empty() || !is_valid_email(email) {
            return Err(FormValidationError::new(
                "employeeEmail",
                "Please enter a valid email address",
            ));
        }

        let Some(expense_date) = self.expense_date else {
            return Err(FormValidationError::new("expenseDate", "Please select an expense date"));
        };

        let amount = match self.amount.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            _ => {
                return Err(FormValidationError::new(
                    "amount",
                    "Please enter a valid amount greater than 0",
                ))
            }
        };

        if self.category.trim().is_empty() {
            return Err(FormValidationError::new("category", "Please select a category"));
        }

        let Some(receipt) = self.receipt.clone() else {
            return Err(FormValidationError::new("receipt", "Please upload a receipt"));
        };

        Ok(ValidatedForm {
            employee_name: name.to_string(),
            employee_email: email.to_string(),
            expense_date,
            amount,
            category: self.category.clone(),
            receipt,
        })
    }
}

// ============================================================================
// SUBMISSION CONTROLLER
// ============================================================================

/// Clears the in-flight flag however the submission ends
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SubmissionController {
    store: ExpenseStore,
    uploader: ReceiptUploader,
    submitting: AtomicBool,
}

impl SubmissionController {
    pub fn new(store: ExpenseStore, uploader: ReceiptUploader) -> Self {
        SubmissionController {
            store,
            uploader,
            submitting: AtomicBool::new(false),
        }
    }

    /// Pick simulated or remote backends from the mock-data flag.
    pub fn from_settings(settings: &Settings) -> Self {
        info!(
            mock_mode = settings.flags.use_mock_data,
            file = %settings.app.excel_file_path,
            table = %settings.app.excel_table_name,
            "Building expense services"
        );

        let (store, uploader) = if settings.flags.use_mock_data {
            let backend = if settings.seed_sample_data {
                SimulatedExpenseBackend::seeded(settings.latency)
            } else {
                SimulatedExpenseBackend::new(settings.latency)
            };
            (
                ExpenseStore::new(Arc::new(backend)),
                ReceiptUploader::simulated(settings.app.clone(), settings.latency.upload),
            )
        } else {
            (
                ExpenseStore::remote(settings.app.clone()),
                ReceiptUploader::remote(settings.app.clone()),
            )
        };

        Self::new(store.with_policy(settings.transition_policy), uploader)
    }

    pub fn store(&self) -> &ExpenseStore {
        &self.store
    }

    pub fn uploader(&self) -> &ReceiptUploader {
        &self.uploader
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub async fn submit(&self, form: &ExpenseForm) -> SubmissionOutcome {
        let validated = match form.validate() {
            Ok(v) => v,
            Err(e) => {
                info!(field = %e.field, "Form validation failed");
                return SubmissionOutcome::failed(e.message.clone(), e.to_string());
            }
        };

        self.submitting.store(true, Ordering::SeqCst);
        let _guard = SubmittingGuard(&self.submitting);

        match self.run_submission(validated).await {
            Ok(id) => {
                let message = if self.store.is_simulated() {
                    "Expense submitted successfully! (Mock Mode)"
                } else {
                    "Expense submitted successfully! Finance team will be notified."
                };
                SubmissionOutcome::succeeded(message, id)
            }
            Err(detail) => {
                error!(error = %detail, "Error submitting expense");
                SubmissionOutcome::failed(GENERIC_FAILURE_MESSAGE, detail)
            }
        }
    }

    /// Returns the new expense id, or the failure detail.
    async fn run_submission(&self, form: ValidatedForm) -> Result<String, String> {
        let expense_id = self.store.generate_id();
        info!(expense_id = %expense_id, "Generated expense id");

        self.uploader
            .validate(Some(&form.receipt))
            .map_err(|e| e.to_string())?;
        let receipt_url = self
            .uploader
            .upload(&form.receipt, &expense_id)
            .await
            .map_err(|e| e.to_string())?;

        let record = ExpenseRecord {
            id: expense_id.clone(),
            employee_name: form.employee_name,
            employee_email: form.employee_email,
            expense_date: form.expense_date,
            amount: form.amount,
            category: form.category,
            receipt_file_name: form.receipt.name,
            receipt_url,
            status: ExpenseStatus::Pending,
            submission_date: Utc::now(),
        };

        let outcome = self.store.add(record).await;
        if !outcome.success {
            return Err(outcome.error.unwrap_or(outcome.message));
        }

        info!(
            expense_id = %expense_id,
            "Submission complete"
        );
        Ok(expense_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::latency::{Latency, LatencyProfile};
    use crate::uploader::MAX_RECEIPT_BYTES;

    fn valid_form() -> ExpenseForm {
        ExpenseForm {
            employee_name: "  Ada Lovelace ".to_string(),
            employee_email: " ada@example.com ".to_string(),
            expense_date: NaiveDate::from_ymd_opt(2025, 3, 14),
            amount: "89.90".to_string(),
            category: "travel".to_string(),
            receipt: Some(ReceiptFile::new("train.pdf", 4096, "application/pdf")),
        }
    }

    fn instant_controller() -> SubmissionController {
        let settings = Settings {
            latency: LatencyProfile::instant(),
            ..Settings::default()
        };
        SubmissionController::from_settings(&settings)
    }

    #[test]
    fn test_validate_messages_per_field() {
        let cases: Vec<(Box<dyn Fn(&mut ExpenseForm)>, &str)> = vec![
            (Box::new(|f: &mut ExpenseForm| f.employee_name = "   ".into()), "Please enter your name"),
            (Box::new(|f: &mut ExpenseForm| f.employee_email = "".into()), "Please enter a valid email address"),
            (Box::new(|f: &mut ExpenseForm| f.employee_email = "ada@example".into()), "Please enter a valid email address"),
            (Box::new(|f: &mut ExpenseForm| f.employee_email = "a da@example.com".into()), "Please enter a valid email address"),
            (Box::new(|f: &mut ExpenseForm| f.expense_date = None), "Please select an expense date"),
            (Box::new(|f: &mut ExpenseForm| f.amount = "".into()), "Please enter a valid amount greater than 0"),
            (Box::new(|f: &mut ExpenseForm| f.amount = "0".into()), "Please enter a valid amount greater than 0"),
            (Box::new(|f: &mut ExpenseForm| f.amount = "-5".into()), "Please enter a valid amount greater than 0"),
            (Box::new(|f: &mut ExpenseForm| f.amount = "12,50".into()), "Please enter a valid amount greater than 0"),
            (Box::new(|f: &mut ExpenseForm| f.category = "".into()), "Please select a category"),
            (Box::new(|f: &mut ExpenseForm| f.receipt = None), "Please upload a receipt"),
        ];

        for (mutate, expected) in cases {
            let mut form = valid_form();
            mutate(&mut form);
            let err = form.validate().unwrap_err();
            assert_eq!(err.message, expected);
        }
    }

    #[test]
    fn test_first_failing_field_wins() {
        let form = ExpenseForm::default();
        assert_eq!(form.validate().unwrap_err().field, "employeeName");
    }

    #[test]
    fn test_validate_trims_and_parses() {
        let validated = valid_form().validate().unwrap();
        assert_eq!(validated.employee_name, "Ada Lovelace");
        assert_eq!(validated.employee_email, "ada@example.com");
        assert_eq!(validated.amount, 89.90);
    }

    #[tokio::test]
    async fn test_submit_success_adds_pending_record() {
        let controller = instant_controller();

        let outcome = controller.submit(&valid_form()).await;
        assert!(outcome.success, "{:?}", outcome);
        assert_eq!(outcome.message, "Expense submitted successfully! (Mock Mode)");
        assert!(!controller.is_submitting());

        let id = outcome.expense_id.unwrap();
        assert!(id.starts_with("EXP-"));

        let record = controller.store().get(&id).await.unwrap().unwrap();
        assert_eq!(record.employee_name, "Ada Lovelace");
        assert_eq!(record.status, ExpenseStatus::Pending);
        assert_eq!(record.receipt_file_name, "train.pdf");
        assert!(record
            .receipt_url
            .ends_with(&format!("/Receipts/receipt_{}.pdf", id)));
    }

    #[tokio::test]
    async fn test_submit_invalid_form_touches_nothing() {
        let controller = instant_controller();
        let mut form = valid_form();
        form.category.clear();

        let outcome = controller.submit(&form).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Please select a category");
        assert!(controller.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_oversized_receipt_is_generic_failure() {
        let controller = instant_controller();
        let mut form = valid_form();
        form.receipt = Some(ReceiptFile::new("scan.pdf", MAX_RECEIPT_BYTES + 1, "application/pdf"));

        let outcome = controller.submit(&form).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, GENERIC_FAILURE_MESSAGE);
        assert!(outcome.error.unwrap().contains("too large"));
        assert!(controller.store().list().await.unwrap().is_empty());
        assert!(!controller.is_submitting());
    }

    #[tokio::test]
    async fn test_submit_remote_mode_fails_not_implemented() {
        let settings = Settings {
            flags: crate::config::FeatureFlags {
                use_mock_data: false,
                enable_debug_logs: false,
            },
            ..Settings::default()
        };
        let controller = SubmissionController::from_settings(&settings);

        let outcome = controller.submit(&valid_form()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, GENERIC_FAILURE_MESSAGE);
        assert!(outcome.error.unwrap().contains("Not implemented"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_submitting_while_upload_in_flight() {
        let store = ExpenseStore::simulated(LatencyProfile::instant());
        let uploader = ReceiptUploader::simulated(AppConfig::default(), Latency::Fixed { ms: 1500 });
        let controller = Arc::new(SubmissionController::new(store, uploader));

        let background = controller.clone();
        let handle = tokio::spawn(async move { background.submit(&valid_form()).await });

        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert!(controller.is_submitting());

        let outcome = handle.await.unwrap();
        assert!(outcome.success);
        assert!(!controller.is_submitting());
    }

    #[test]
    fn test_category_options() {
        let keys: Vec<_> = CATEGORY_OPTIONS.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["travel", "food", "office", "equipment", "software", "other"]);
    }
}
