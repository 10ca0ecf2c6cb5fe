/// Repository trait for import job persistence
///
/// Terminal writes are idempotent: finishing a job that is already terminal
/// (or gone) is a no-op reported as `Ok(false)`.
use crate::modules::client_imports::domain::entities::{ImportJob, ImportTally, NewImportJob};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientImportRepository: Send + Sync {
    /// Write a new job row
    async fn create(&self, job: NewImportJob) -> AppResult<ImportJob>;

    /// Get job by ID
    async fn get_by_id(&self, job_id: Uuid) -> AppResult<Option<ImportJob>>;

    /// All jobs of an owner, newest first
    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<ImportJob>>;

    /// Move a processing job to completed with final counts
    async fn mark_completed(&self, job_id: Uuid, tally: ImportTally) -> AppResult<bool>;

    /// Move a processing job to failed
    async fn mark_failed(&self, job_id: Uuid) -> AppResult<bool>;

    /// Delete a job row
    async fn delete(&self, job_id: Uuid) -> AppResult<()>;

    /// Get import statistics for an owner
    async fn get_statistics(&self, owner_id: Uuid) -> AppResult<ImportStatistics>;
}

/// Import statistics for the imports overview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub processing_count: i64,
    pub completed_count: i64,
    pub failed_count: i64,
    pub total_count: i64,
    pub records_total: i64,
    pub records_successful: i64,
    pub records_failed: i64,
}
