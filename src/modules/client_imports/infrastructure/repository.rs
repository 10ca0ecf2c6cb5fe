/// Record-store implementation of ClientImportRepository
///
/// Works against any `RecordStore`, so ownership is whatever the store's
/// session enforces. Terminal writes are conditional on `status = processing`
/// in the same store call, so concurrent finishers cannot both win.
use crate::modules::client_imports::domain::entities::{
    ImportJob, ImportStatus, ImportTally, NewImportJob,
};
use crate::modules::client_imports::domain::repository::{
    ClientImportRepository, ImportStatistics,
};
use crate::modules::client_imports::infrastructure::models::{
    ClientImportRow, ClientImportStatusPatch, NewClientImportRow, CLIENT_IMPORTS_TABLE,
    STATUS_COLUMN,
};
use crate::modules::records::domain::record::{CREATED_AT_COLUMN, ID_COLUMN, OWNER_COLUMN};
use crate::modules::records::domain::{QueryFilter, RecordStore};
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct ClientImportRepositoryImpl {
    store: Arc<dyn RecordStore>,
}

impl ClientImportRepositoryImpl {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Apply a terminal status if the job is still processing
    async fn finish(
        &self,
        job_id: Uuid,
        next: ImportStatus,
        patch: ClientImportStatusPatch,
    ) -> AppResult<bool> {
        if !ImportStatus::Processing.can_transition_to(next) {
            return Err(AppError::InvalidInput(format!(
                "Import {} cannot be finished as {}",
                job_id, next
            )));
        }

        let still_processing =
            QueryFilter::new().eq(STATUS_COLUMN, ImportStatus::Processing.to_string());

        let updated = self
            .store
            .update_where(
                CLIENT_IMPORTS_TABLE,
                job_id,
                &still_processing,
                patch.into_record()?,
            )
            .await?;

        if updated {
            log_info!("Import {} marked {}", job_id, next);
        } else {
            log_debug!(
                "Import {} is gone or no longer processing, skipping {} write",
                job_id,
                next
            );
        }
        Ok(updated)
    }
}

#[async_trait]
impl ClientImportRepository for ClientImportRepositoryImpl {
    async fn create(&self, job: NewImportJob) -> AppResult<ImportJob> {
        let row = NewClientImportRow::from(&job).into_record()?;

        let inserted = self.store.insert(CLIENT_IMPORTS_TABLE, row).await?;

        ClientImportRow::from_record(inserted)?.to_import_job()
    }

    async fn get_by_id(&self, job_id: Uuid) -> AppResult<Option<ImportJob>> {
        let filter = QueryFilter::new()
            .eq(ID_COLUMN, job_id.to_string())
            .limit(1);

        let rows = self.store.query(CLIENT_IMPORTS_TABLE, &filter).await?;

        rows.into_iter()
            .next()
            .map(|row| ClientImportRow::from_record(row)?.to_import_job())
            .transpose()
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<ImportJob>> {
        let filter = QueryFilter::new()
            .eq(OWNER_COLUMN, owner_id.to_string())
            .order_desc(CREATED_AT_COLUMN);

        let rows = self.store.query(CLIENT_IMPORTS_TABLE, &filter).await?;

        rows.into_iter()
            .map(|row| ClientImportRow::from_record(row)?.to_import_job())
            .collect()
    }

    async fn mark_completed(&self, job_id: Uuid, tally: ImportTally) -> AppResult<bool> {
        self.finish(
            job_id,
            ImportStatus::Completed,
            ClientImportStatusPatch::completed(tally),
        )
        .await
    }

    async fn mark_failed(&self, job_id: Uuid) -> AppResult<bool> {
        self.finish(job_id, ImportStatus::Failed, ClientImportStatusPatch::failed())
            .await
    }

    async fn delete(&self, job_id: Uuid) -> AppResult<()> {
        self.store.delete(CLIENT_IMPORTS_TABLE, job_id).await
    }

    async fn get_statistics(&self, owner_id: Uuid) -> AppResult<ImportStatistics> {
        let jobs = self.list_for_owner(owner_id).await?;

        let stats = jobs
            .iter()
            .fold(ImportStatistics::default(), |mut stats, job| {
                match job.status {
                    ImportStatus::Processing => stats.processing_count += 1,
                    ImportStatus::Completed => stats.completed_count += 1,
                    ImportStatus::Failed => stats.failed_count += 1,
                }
                stats.total_count += 1;
                stats.records_total += i64::from(job.total_records);
                stats.records_successful += i64::from(job.successful_imports);
                stats.records_failed += i64::from(job.failed_imports);
                stats
            });

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::client_imports::domain::entities::ImportType;
    use crate::modules::records::infrastructure::MemoryRecordStore;

    fn repository() -> (ClientImportRepositoryImpl, Uuid) {
        let owner = Uuid::new_v4();
        let store = MemoryRecordStore::new().as_owner(owner);
        (ClientImportRepositoryImpl::new(Arc::new(store)), owner)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, owner) = repository();
        let created = repo
            .create(NewImportJob::processing(
                owner,
                "clients.csv",
                "clients",
                ImportType::Customers,
            ))
            .await
            .unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, ImportStatus::Processing);
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_terminal_writes_are_idempotent() {
        let (repo, owner) = repository();
        let job = repo
            .create(NewImportJob::processing(owner, "a.csv", "a", ImportType::Leads))
            .await
            .unwrap();

        assert!(repo.mark_completed(job.id, ImportTally::new(5, 4)).await.unwrap());
        assert!(!repo.mark_failed(job.id).await.unwrap());
        assert!(!repo
            .mark_completed(job.id, ImportTally::new(9, 9))
            .await
            .unwrap());

        let job = repo.get_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, ImportStatus::Completed);
        assert_eq!(job.tally(), ImportTally::new(5, 4));
    }

    #[tokio::test]
    async fn test_finishing_a_deleted_job_is_a_no_op() {
        let (repo, owner) = repository();
        let job = repo
            .create(NewImportJob::processing(owner, "a.csv", "a", ImportType::Leads))
            .await
            .unwrap();
        repo.delete(job.id).await.unwrap();

        assert!(!repo.mark_failed(job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_finishers_have_one_winner() {
        let (repo, owner) = repository();
        let repo = Arc::new(repo);

        for _ in 0..20 {
            let job = repo
                .create(NewImportJob::processing(owner, "a.csv", "a", ImportType::Customers))
                .await
                .unwrap();

            let completer = {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.mark_completed(job.id, ImportTally::new(4, 3)).await })
            };
            let failer = {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.mark_failed(job.id).await })
            };

            let completed = completer.await.unwrap().unwrap();
            let failed = failer.await.unwrap().unwrap();
            assert!(completed ^ failed);

            let job = repo.get_by_id(job.id).await.unwrap().unwrap();
            let expected = if completed {
                ImportStatus::Completed
            } else {
                ImportStatus::Failed
            };
            assert_eq!(job.status, expected);
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_statistics() {
        let (repo, owner) = repository();
        for (name, tally) in [("first", ImportTally::new(3, 3)), ("second", ImportTally::new(2, 1))] {
            repo.create(NewImportJob::completed(
                owner,
                &format!("{}.csv", name),
                name,
                ImportType::Customers,
                tally,
            ))
            .await
            .unwrap();
        }
        repo.create(NewImportJob::processing(owner, "third.csv", "third", ImportType::Projects))
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_for_owner(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|job| job.import_name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);

        let stats = repo.get_statistics(owner).await.unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.processing_count, 1);
        assert_eq!(stats.records_total, 5);
        assert_eq!(stats.records_successful, 4);
        assert_eq!(stats.records_failed, 1);
    }
}
