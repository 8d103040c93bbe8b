// 📊 Expense Store - the shared expense table
// Add / list / status update over a pluggable backend:
//   SimulatedExpenseBackend → in-memory rows + injected latency
//   RemoteExpenseBackend    → spreadsheet API, not implemented yet

use crate::config::AppConfig;
use crate::error::{ExpenseError, Result};
use crate::latency::LatencyProfile;
use crate::models::{ExpenseRecord, ExpenseStatus, SubmissionOutcome};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

// ============================================================================
// TRANSITION POLICY
// ============================================================================

/// Which status changes `update_status` accepts for a record that exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may overwrite any other (admin override)
    #[default]
    Permissive,
    /// Only Pending → Approved | Rejected
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: ExpenseStatus, to: ExpenseStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => from == ExpenseStatus::Pending && to.is_terminal(),
        }
    }
}

// ============================================================================
// BACKEND TRAIT
// ============================================================================

/// Storage behind the expense table. Selected once at construction.
#[async_trait]
pub trait ExpenseBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_simulated(&self) -> bool;

    async fn append(&self, record: ExpenseRecord) -> Result<()>;

    async fn read_all(&self) -> Result<Vec<ExpenseRecord>>;

    /// Ok(false) when no row has this id
    async fn set_status(
        &self,
        id: &str,
        status: ExpenseStatus,
        policy: TransitionPolicy,
    ) -> Result<bool>;
}

// ============================================================================
// SIMULATED BACKEND
// ============================================================================

pub struct SimulatedExpenseBackend {
    records: RwLock<Vec<ExpenseRecord>>,
    latency: LatencyProfile,
}

impl SimulatedExpenseBackend {
    pub fn new(latency: LatencyProfile) -> Self {
        SimulatedExpenseBackend {
            records: RwLock::new(Vec::new()),
            latency,
        }
    }

    pub fn with_records(latency: LatencyProfile, records: Vec<ExpenseRecord>) -> Self {
        info!(count = records.len(), "Simulated expense table seeded");
        SimulatedExpenseBackend {
            records: RwLock::new(records),
            latency,
        }
    }

    pub fn seeded(latency: LatencyProfile) -> Self {
        Self::with_records(latency, ExpenseRecord::sample_records())
    }
}

#[async_trait]
impl ExpenseBackend for SimulatedExpenseBackend {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn is_simulated(&self) -> bool {
        true
    }

    async fn append(&self, record: ExpenseRecord) -> Result<()> {
        self.latency.add.wait().await;

        let mut records = self.records.write().await;
        records.push(record);
        debug!(total = records.len(), "Simulated table row appended");
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        self.latency.list.wait().await;

        let records = self.records.read().await;
        debug!(total = records.len(), "Simulated table read");
        Ok(records.clone())
    }

    async fn set_status(
        &self,
        id: &str,
        status: ExpenseStatus,
        policy: TransitionPolicy,
    ) -> Result<bool> {
        self.latency.update.wait().await;

        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };

        if !policy.allows(record.status, status) {
            return Err(ExpenseError::InvalidStatusTransition {
                id: id.to_string(),
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        Ok(true)
    }
}

// ============================================================================
// REMOTE BACKEND
// ============================================================================

/// Spreadsheet API backend. Every call fails with `NotImplemented` until the
/// site's workbook endpoints are wired up.
pub struct RemoteExpenseBackend {
    config: AppConfig,
}

impl RemoteExpenseBackend {
    pub fn new(config: AppConfig) -> Self {
        RemoteExpenseBackend { config }
    }

    fn unavailable(&self, operation: &str) -> ExpenseError {
        ExpenseError::not_implemented(format!(
            "{} on table '{}' in '{}' is not available yet. Waiting for site configuration.",
            operation, self.config.excel_table_name, self.config.excel_file_path
        ))
    }
}

#[async_trait]
impl ExpenseBackend for RemoteExpenseBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn is_simulated(&self) -> bool {
        false
    }

    async fn append(&self, _record: ExpenseRecord) -> Result<()> {
        Err(self.unavailable("Appending a row"))
    }

    async fn read_all(&self) -> Result<Vec<ExpenseRecord>> {
        Err(self.unavailable("Reading rows"))
    }

    async fn set_status(
        &self,
        _id: &str,
        _status: ExpenseStatus,
        _policy: TransitionPolicy,
    ) -> Result<bool> {
        Err(self.unavailable("Updating the status column"))
    }
}

// ============================================================================
// EXPENSE STORE
// ============================================================================

/// Owned, injectable handle on the expense table. Cloning shares the backend.
#[derive(Clone)]
pub struct ExpenseStore {
    backend: Arc<dyn ExpenseBackend>,
    policy: TransitionPolicy,
}

impl ExpenseStore {
    pub fn new(backend: Arc<dyn ExpenseBackend>) -> Self {
        info!(backend = backend.name(), "Expense store initialized");
        ExpenseStore {
            backend,
            policy: TransitionPolicy::default(),
        }
    }

    pub fn simulated(latency: LatencyProfile) -> Self {
        Self::new(Arc::new(SimulatedExpenseBackend::new(latency)))
    }

    pub fn remote(config: AppConfig) -> Self {
        Self::new(Arc::new(RemoteExpenseBackend::new(config)))
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn is_simulated(&self) -> bool {
        self.backend.is_simulated()
    }

    /// Append a record. Never returns Err: backend failures come back as a
    /// failed outcome carrying the error text.
    pub async fn add(&self, record: ExpenseRecord) -> SubmissionOutcome {
        let id = record.id.clone();
        debug!(expense_id = %id, amount = record.amount, "Adding expense");

        match self.backend.append(record).await {
            Ok(()) => {
                info!(expense_id = %id, "Expense added");
                let message = if self.backend.is_simulated() {
                    "Expense submitted successfully! (Mock mode)"
                } else {
                    "Expense submitted successfully!"
                };
                SubmissionOutcome::succeeded(message, id)
            }
            Err(e) => {
                tracing::error!(expense_id = %id, error = %e, "Failed to add expense");
                SubmissionOutcome::failed("Failed to submit expense", e.to_string())
            }
        }
    }

    /// Snapshot of every record in insertion order
    pub async fn list(&self) -> Result<Vec<ExpenseRecord>> {
        let records = self.backend.read_all().await?;
        debug!(count = records.len(), "Fetched expenses");
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ExpenseRecord>> {
        Ok(self.list().await?.into_iter().find(|r| r.id == id))
    }

    /// Ok(true) if the record was found and updated, Ok(false) if no record
    /// has this id.
    pub async fn update_status(&self, id: &str, status: ExpenseStatus) -> Result<bool> {
        info!(expense_id = %id, status = %status, "Updating expense status");

        let updated = self.backend.set_status(id, status, self.policy).await?;
        if !updated {
            warn!(expense_id = %id, "Expense not found");
        }
        Ok(updated)
    }

    pub fn generate_id(&self) -> String {
        generate_expense_id()
    }
}

/// `EXP-<unix millis>-<48 random bits as hex>`. Unique with overwhelming
/// probability, not guaranteed.
pub fn generate_expense_id() -> String {
    let timestamp = Utc::now().timestamp_millis();
    let random: u64 = rand::thread_rng().gen::<u64>() & 0xFFFF_FFFF_FFFF;
    format!("EXP-{}-{:012x}", timestamp, random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::midnight_utc;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn create_test_record(id: &str, status: ExpenseStatus) -> ExpenseRecord {
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        ExpenseRecord {
            id: id.to_string(),
            employee_name: "Test User".to_string(),
            employee_email: "test@example.com".to_string(),
            expense_date: day,
            amount: 42.75,
            category: "travel".to_string(),
            receipt_file_name: "taxi.png".to_string(),
            receipt_url: format!("https://example.com/Receipts/receipt_{}.png", id),
            status,
            submission_date: midnight_utc(day),
        }
    }

    fn instant_store() -> ExpenseStore {
        ExpenseStore::simulated(LatencyProfile::instant())
    }

    #[tokio::test]
    async fn test_add_then_list_returns_record_unchanged() {
        let store = instant_store();
        let record = create_test_record("EXP-100", ExpenseStatus::Pending);

        let outcome = store.add(record.clone()).await;
        assert!(outcome.success);
        assert_eq!(outcome.expense_id.as_deref(), Some("EXP-100"));
        assert_eq!(outcome.message, "Expense submitted successfully! (Mock mode)");

        let records = store.list().await.unwrap();
        let matching: Vec<_> = records.iter().filter(|r| r.id == "EXP-100").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0], &record);
    }

    #[tokio::test]
    async fn test_list_returns_copy() {
        let store = instant_store();
        store.add(create_test_record("EXP-001", ExpenseStatus::Pending)).await;

        let mut snapshot = store.list().await.unwrap();
        snapshot[0].status = ExpenseStatus::Rejected;
        snapshot.push(create_test_record("EXP-999", ExpenseStatus::Approved));
        snapshot.clear();

        let again = store.list().await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].status, ExpenseStatus::Pending);
    }

    #[tokio::test]
    async fn test_two_records_listed_in_insertion_order() {
        let store = instant_store();
        store.add(create_test_record("EXP-001", ExpenseStatus::Pending)).await;
        store.add(create_test_record("EXP-002", ExpenseStatus::Approved)).await;

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "EXP-001");
        assert_eq!(records[0].status, ExpenseStatus::Pending);
        assert_eq!(records[1].id, "EXP-002");
        assert_eq!(records[1].status, ExpenseStatus::Approved);
    }

    #[tokio::test]
    async fn test_update_status_existing_and_unknown() {
        let store = instant_store();
        store.add(create_test_record("EXP-001", ExpenseStatus::Pending)).await;

        assert!(store.update_status("EXP-001", ExpenseStatus::Approved).await.unwrap());
        let records = store.list().await.unwrap();
        assert_eq!(records[0].status, ExpenseStatus::Approved);

        let before = store.list().await.unwrap();
        assert!(!store.update_status("EXP-404", ExpenseStatus::Approved).await.unwrap());
        assert_eq!(store.list().await.unwrap(), before);
    }

    // Permissive is the default: terminal records can be overwritten, even back to Pending.
    #[tokio::test]
    async fn test_permissive_policy_allows_any_overwrite() {
        let store = instant_store();
        store.add(create_test_record("EXP-001", ExpenseStatus::Approved)).await;

        assert!(store.update_status("EXP-001", ExpenseStatus::Pending).await.unwrap());
        assert!(store.update_status("EXP-001", ExpenseStatus::Rejected).await.unwrap());
        assert_eq!(store.get("EXP-001").await.unwrap().unwrap().status, ExpenseStatus::Rejected);
    }

    #[tokio::test]
    async fn test_strict_policy_only_moves_out_of_pending() {
        let store = instant_store().with_policy(TransitionPolicy::Strict);
        store.add(create_test_record("EXP-001", ExpenseStatus::Pending)).await;

        assert!(store.update_status("EXP-001", ExpenseStatus::Approved).await.unwrap());

        let err = store
            .update_status("EXP-001", ExpenseStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExpenseError::InvalidStatusTransition {
                from: ExpenseStatus::Approved,
                to: ExpenseStatus::Pending,
                ..
            }
        ));
        assert_eq!(store.get("EXP-001").await.unwrap().unwrap().status, ExpenseStatus::Approved);

        // Unknown ids are still a plain false under strict policy
        assert!(!store.update_status("EXP-404", ExpenseStatus::Rejected).await.unwrap());
    }

    #[test]
    fn test_policy_table() {
        use ExpenseStatus::*;
        let strict = TransitionPolicy::Strict;
        assert!(strict.allows(Pending, Approved));
        assert!(strict.allows(Pending, Rejected));
        assert!(!strict.allows(Pending, Pending));
        assert!(!strict.allows(Approved, Rejected));
        assert!(!strict.allows(Rejected, Pending));
        assert!(TransitionPolicy::Permissive.allows(Rejected, Pending));
    }

    #[tokio::test]
    async fn test_seeded_backend_has_sample_rows() {
        let store = ExpenseStore::new(Arc::new(SimulatedExpenseBackend::seeded(
            LatencyProfile::instant(),
        )));
        let records = store.list().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["EXP-001", "EXP-002"]);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let a = instant_store();
        let b = instant_store();
        a.add(create_test_record("EXP-001", ExpenseStatus::Pending)).await;

        assert_eq!(a.list().await.unwrap().len(), 1);
        assert!(b.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_backend_is_not_implemented() {
        let store = ExpenseStore::remote(AppConfig::default());
        assert!(!store.is_simulated());

        let outcome = store.add(create_test_record("EXP-001", ExpenseStatus::Pending)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to submit expense");
        assert!(outcome.error.unwrap().contains("ExpenseTable"));

        assert!(store.list().await.unwrap_err().is_not_implemented());
        assert!(store
            .update_status("EXP-001", ExpenseStatus::Approved)
            .await
            .unwrap_err()
            .is_not_implemented());
    }

    #[test]
    fn test_generate_id_format() {
        let id = generate_expense_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "EXP");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 12);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_id_10000_unique() {
        let store = instant_store();
        let ids: HashSet<String> = (0..10_000).map(|_| store.generate_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
