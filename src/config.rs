// ⚙️ Application configuration
// Site + spreadsheet locations, feature flags and simulated latency.
// Read once when the services are built; never mutated afterwards.

use crate::error::{ExpenseError, Result};
use crate::latency::LatencyProfile;
use crate::store::TransitionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Env var that overrides `flags.use_mock_data` ("true"/"false", "1"/"0")
pub const USE_MOCK_DATA_ENV: &str = "EXPENSE_USE_MOCK_DATA";

/// Where the expense table and receipts live on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub site_url: String,
    pub excel_file_path: String,
    pub receipts_folder_path: String,
    pub excel_table_name: String,
}

impl Default for AppConfig {
    // Placeholders until the site is provisioned
    fn default() -> Self {
        AppConfig {
            site_url: "https://placeholder.sharepoint.com/sites/ExpenseApp".to_string(),
            excel_file_path: "/sites/ExpenseApp/Shared Documents/ExpenseData.xlsx".to_string(),
            receipts_folder_path: "/sites/ExpenseApp/Shared Documents/Receipts".to_string(),
            excel_table_name: "ExpenseTable".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    /// true = simulated backends, false = remote backends
    pub use_mock_data: bool,
    pub enable_debug_logs: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags {
            use_mock_data: true,
            enable_debug_logs: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub app: AppConfig,
    pub flags: FeatureFlags,
    pub latency: LatencyProfile,
    pub transition_policy: TransitionPolicy,
    /// Start the simulated table with the two demonstration rows
    pub seed_sample_data: bool,
}

impl Settings {
    /// Load settings from a JSON file. Missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExpenseError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Settings::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Settings> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `EXPENSE_USE_MOCK_DATA` if set
    pub fn with_env_overrides(mut self) -> Result<Settings> {
        if let Ok(raw) = std::env::var(USE_MOCK_DATA_ENV) {
            self.flags.use_mock_data = parse_flag(&raw).ok_or_else(|| {
                ExpenseError::Config(format!("{} must be true or false, got '{}'", USE_MOCK_DATA_ENV, raw))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app.site_url.trim().is_empty() {
            return Err(ExpenseError::Config("siteUrl must not be empty".to_string()));
        }
        if self.app.excel_table_name.trim().is_empty() {
            return Err(ExpenseError::Config("excelTableName must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
