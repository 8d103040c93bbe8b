// Expense Intake - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod controller;     // Form validation + submission sequence
pub mod error;
pub mod export;         // Spreadsheet rows, CSV export/import
pub mod latency;        // Simulated round-trip delays
pub mod models;
pub mod store;          // Expense table: simulated + remote backends
pub mod uploader;       // Receipt validation + upload

// Re-export commonly used types
pub use config::{AppConfig, FeatureFlags, Settings};
pub use controller::{
    CategoryOption, ExpenseForm, FormValidationError, SubmissionController, ValidatedForm,
    CATEGORY_OPTIONS,
};
pub use error::{ExpenseError, Result};
pub use export::{export_csv, import_csv, read_csv, write_csv, SpreadsheetRow};
pub use latency::{Latency, LatencyProfile};
pub use models::{ExpenseRecord, ExpenseStatus, ReceiptFile, SubmissionOutcome};
pub use store::{
    generate_expense_id, ExpenseBackend, ExpenseStore, RemoteExpenseBackend,
    SimulatedExpenseBackend, TransitionPolicy,
};
pub use uploader::{
    ReceiptBackend, ReceiptUploader, RemoteReceiptBackend, SimulatedReceiptBackend,
    ALLOWED_MIME_TYPES, MAX_RECEIPT_BYTES,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the fmt subscriber. `RUST_LOG` wins over the debug-logs flag.
pub fn init_tracing(enable_debug_logs: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if enable_debug_logs { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!(
            "expense_intake={0},expense_server={0}",
            default_level
        )));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
