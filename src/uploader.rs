// 📁 Receipt Uploader
// Validates a receipt and stores it, returning its location reference.
// Simulated backend synthesizes the URL; remote backend is not implemented yet.

use crate::config::AppConfig;
use crate::error::{ExpenseError, Result};
use crate::latency::Latency;
use crate::models::ReceiptFile;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// 10 MiB
pub const MAX_RECEIPT_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "application/pdf",
];

/// Stored file name for a receipt: `receipt_<expense id>.<original extension>`
pub fn receipt_file_name(file: &ReceiptFile, expense_id: &str) -> String {
    format!("receipt_{}.{}", expense_id, file.extension())
}

#[async_trait]
pub trait ReceiptBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store an already-validated file and return where it lives
    async fn store(&self, file: &ReceiptFile, expense_id: &str) -> Result<String>;
}

// ============================================================================
// SIMULATED BACKEND
// ============================================================================

/// Stores no bytes. Waits, then returns
/// `<site_url><receipts_folder_path>/receipt_<id>.<ext>`.
pub struct SimulatedReceiptBackend {
    config: AppConfig,
    latency: Latency,
}

impl SimulatedReceiptBackend {
    pub fn new(config: AppConfig, latency: Latency) -> Self {
        SimulatedReceiptBackend { config, latency }
    }
}

#[async_trait]
impl ReceiptBackend for SimulatedReceiptBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn store(&self, file: &ReceiptFile, expense_id: &str) -> Result<String> {
        self.latency.wait().await;

        let url = format!(
            "{}{}/{}",
            self.config.site_url,
            self.config.receipts_folder_path,
            receipt_file_name(file, expense_id)
        );
        debug!(url = %url, "Simulated receipt upload");
        Ok(url)
    }
}

// ============================================================================
// REMOTE BACKEND
// ============================================================================

pub struct RemoteReceiptBackend {
    config: AppConfig,
}

impl RemoteReceiptBackend {
    pub fn new(config: AppConfig) -> Self {
        RemoteReceiptBackend { config }
    }
}

#[async_trait]
impl ReceiptBackend for RemoteReceiptBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn store(&self, _file: &ReceiptFile, _expense_id: &str) -> Result<String> {
        Err(ExpenseError::not_implemented(format!(
            "Uploading to '{}' is not available yet. Waiting for site configuration.",
            self.config.receipts_folder_path
        )))
    }
}

// ============================================================================
// RECEIPT UPLOADER
// ============================================================================

#[derive(Clone)]
pub struct ReceiptUploader {
    backend: Arc<dyn ReceiptBackend>,
}

impl ReceiptUploader {
    pub fn new(backend: Arc<dyn ReceiptBackend>) -> Self {
        info!(backend = backend.name(), "Receipt uploader initialized");
        ReceiptUploader { backend }
    }

    pub fn simulated(config: AppConfig, latency: Latency) -> Self {
        Self::new(Arc::new(SimulatedReceiptBackend::new(config, latency)))
    }

    pub fn remote(config: AppConfig) -> Self {
        Self::new(Arc::new(RemoteReceiptBackend::new(config)))
    }

    /// Synchronous pre-upload check: present, ≤ 10 MiB, allowed MIME type.
    pub fn validate(&self, file: Option<&ReceiptFile>) -> Result<bool> {
        let file = file.ok_or_else(|| ExpenseError::invalid_input("No file selected"))?;

        if file.size > MAX_RECEIPT_BYTES {
            return Err(ExpenseError::invalid_input(
                "File is too large. Maximum size is 10MB.",
            ));
        }

        if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            return Err(ExpenseError::invalid_input(
                "Invalid file type. Please upload an image (JPG, PNG, GIF) or PDF.",
            ));
        }

        debug!(name = %file.name, size = file.size, "Receipt is valid");
        Ok(true)
    }

    /// Validate, then store. Backend errors propagate unchanged.
    pub async fn upload(&self, file: &ReceiptFile, expense_id: &str) -> Result<String> {
        self.validate(Some(file))?;

        info!(
            name = %file.name,
            size = file.size,
            expense_id = %expense_id,
            "Uploading receipt"
        );
        let url = self.backend.store(file, expense_id).await?;
        info!(url = %url, "Receipt uploaded");
        Ok(url)
    }
}
