use crate::log_info;
use crate::modules::client_imports::domain::entities::{ImportJob, NewImportJob};
use crate::modules::client_imports::domain::repository::{
    ClientImportRepository, ImportStatistics,
};
use crate::modules::client_imports::domain::services::import_components::{
    CsvParser, ImportCoordinator, ImportUpload,
};
use crate::modules::client_imports::infrastructure::{
    ClientImportRepositoryImpl, CLIENT_IMPORTS_TABLE,
};
use crate::modules::client_imports::worker::{
    BackgroundImportWorker, BackgroundTasks, ImportProgressReporter,
};
use crate::modules::records::domain::{
    AuthUser, ChangeEvent, IdentityProvider, RecordStore,
};
use crate::modules::records::infrastructure::{ChangeFeed, ObservedRecordStore, Subscription};
use crate::shared::config::AppConfig;
use crate::shared::errors::{AppError, AppResult};

use std::sync::Arc;
use uuid::Uuid;

/// Client import service - the one entry point for submitting and managing imports
///
/// Every write goes through an `ObservedRecordStore`, so subscribers see the
/// same changes whichever submission path produced them.
#[derive(Clone)]
pub struct ClientImportService {
    repository: Arc<dyn ClientImportRepository>,
    coordinator: ImportCoordinator,
    reporter: Arc<ImportProgressReporter>,
    worker: Arc<BackgroundImportWorker>,
    feed: Arc<ChangeFeed>,
    tasks: BackgroundTasks,
}

impl ClientImportService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        identity: Arc<dyn IdentityProvider>,
        feed: Arc<ChangeFeed>,
        config: &AppConfig,
    ) -> Self {
        let store: Arc<dyn RecordStore> =
            Arc::new(ObservedRecordStore::new(store, Arc::clone(&feed)));
        let repository: Arc<dyn ClientImportRepository> =
            Arc::new(ClientImportRepositoryImpl::new(Arc::clone(&store)));

        let coordinator = ImportCoordinator::new(store, Arc::clone(&repository), identity)
            .with_parser(CsvParser::new(config.csv_delimiter))
            .with_concurrency(config.import_concurrency);

        let tasks = BackgroundTasks::new();
        let reporter = ImportProgressReporter::new(
            Arc::clone(&repository),
            tasks.clone(),
            config.simulation.clone(),
        );
        let worker = BackgroundImportWorker::new(coordinator.clone(), tasks.clone());

        Self {
            repository,
            coordinator,
            reporter: Arc::new(reporter),
            worker: Arc::new(worker),
            feed,
            tasks,
        }
    }

    async fn current_user(&self) -> AppResult<AuthUser> {
        self.coordinator.authenticate().await
    }

    /// Parse, insert every row and write a `completed` summary before returning
    pub async fn submit_import(&self, upload: ImportUpload) -> AppResult<ImportJob> {
        self.coordinator.run_import(upload).await
    }

    /// Job returned in `processing`; randomized counts arrive later
    pub async fn submit_simulated(&self, upload: ImportUpload) -> AppResult<ImportJob> {
        // Same rejections as a real import, but no rows are inserted
        let prepared = self.coordinator.prepare(&upload).await?;
        let job = NewImportJob::processing(
            prepared.owner_id,
            &prepared.file_name,
            &prepared.import_name,
            prepared.import_type,
        );

        self.reporter.submit(job).await
    }

    /// Job returned in `processing`; rows are inserted on a background task
    pub async fn submit_background(&self, upload: ImportUpload) -> AppResult<ImportJob> {
        self.worker.submit(upload).await
    }

    /// The caller's imports, newest first
    pub async fn list_imports(&self) -> AppResult<Vec<ImportJob>> {
        let user = self.current_user().await?;
        self.repository.list_for_owner(user.id).await
    }

    pub async fn get_import(&self, job_id: Uuid) -> AppResult<Option<ImportJob>> {
        let user = self.current_user().await?;
        let job = self.repository.get_by_id(job_id).await?;
        Ok(job.filter(|job| job.owner_id == user.id))
    }

    pub async fn delete_import(&self, job_id: Uuid) -> AppResult<()> {
        let user = self.current_user().await?;

        let job = self
            .repository
            .get_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Import {} not found", job_id)))?;

        if job.owner_id != user.id {
            return Err(AppError::Unauthorized(format!(
                "Import {} belongs to another user",
                job_id
            )));
        }

        self.repository.delete(job_id).await?;
        log_info!("Deleted import {} ('{}')", job_id, job.import_name);
        Ok(())
    }

    pub async fn get_statistics(&self) -> AppResult<ImportStatistics> {
        let user = self.current_user().await?;
        self.repository.get_statistics(user.id).await
    }

    /// Called for every change to the imports table until the handle is dropped
    pub fn subscribe_imports<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.feed.subscribe(CLIENT_IMPORTS_TABLE, on_change)
    }

    pub fn pending_background_tasks(&self) -> usize {
        self.tasks.pending()
    }

    /// Cancel simulated jobs still waiting and wait for running imports
    pub async fn shutdown(&self) {
        self.tasks.shutdown().await;
    }
}
