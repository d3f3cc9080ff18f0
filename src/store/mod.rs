//! Fit record storage.
//!
//! The orchestrator only needs two operations: create a record after a
//! successful fit, and list an owner's records for the dashboard. Anything
//! implementing `FitStore` can back it:
//!
//! - `MemoryStore`: in-process, used by tests and embedding callers
//! - `JsonFileStore`: a single JSON document on disk, used by the CLI

use chrono::Utc;

use crate::domain::{FitRecord, RecordId, UserId};
use crate::error::StoreError;

pub mod json;

pub use json::JsonFileStore;

/// Storage collaborator consumed by the orchestrator.
pub trait FitStore {
    /// Persist a new record and return its identifier.
    fn create_fit_record(
        &mut self,
        owner: &UserId,
        dataset_name: &str,
        serialized_params: &str,
    ) -> Result<RecordId, StoreError>;

    /// All records owned by `owner`, oldest first.
    fn list_fit_records(&self, owner: &UserId) -> Result<Vec<FitRecord>, StoreError>;
}

/// In-memory store with monotonically increasing ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<FitRecord>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all owners.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FitStore for MemoryStore {
    fn create_fit_record(
        &mut self,
        owner: &UserId,
        dataset_name: &str,
        serialized_params: &str,
    ) -> Result<RecordId, StoreError> {
        self.next_id += 1;
        let id = RecordId(self.next_id);
        self.records.push(FitRecord {
            id,
            owner: owner.clone(),
            dataset_name: dataset_name.to_string(),
            params: serialized_params.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn list_fit_records(&self, owner: &UserId) -> Result<Vec<FitRecord>, StoreError> {
        Ok(self.records.iter().filter(|r| &r.owner == owner).cloned().collect())
    }
}
