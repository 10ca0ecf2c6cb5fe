use crate::modules::client_imports::domain::entities::{ImportJob, NewImportJob};
use crate::modules::client_imports::domain::repository::ClientImportRepository;
use crate::modules::records::domain::{AuthUser, IdentityProvider, RecordStore};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_info, log_warn};

use futures::{stream, StreamExt};
use std::sync::Arc;

use super::column_mapper::ColumnMapper;
use super::csv_parser::CsvParser;
use super::import_executor::ImportExecutor;
use super::types::{ImportRun, ImportUpload, PreparedImport};

/// Orchestrates the import workflow: authenticate, parse, map, insert, summarize
#[derive(Clone)]
pub struct ImportCoordinator {
    store: Arc<dyn RecordStore>,
    repository: Arc<dyn ClientImportRepository>,
    identity: Arc<dyn IdentityProvider>,
    parser: CsvParser,
    concurrency: usize,
}

impl ImportCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        repository: Arc<dyn ClientImportRepository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            repository,
            identity,
            parser: CsvParser::default(),
            concurrency: 1,
        }
    }

    pub fn with_parser(mut self, parser: CsvParser) -> Self {
        self.parser = parser;
        self
    }

    /// Number of row inserts kept in flight; 1 keeps file order
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn repository(&self) -> Arc<dyn ClientImportRepository> {
        Arc::clone(&self.repository)
    }

    pub async fn authenticate(&self) -> AppResult<AuthUser> {
        self.identity
            .current_user()
            .await?
            .ok_or(AppError::NotAuthenticated)
    }

    /// Everything that must succeed before any write happens
    pub async fn prepare(&self, upload: &ImportUpload) -> AppResult<PreparedImport> {
        let user = self.authenticate().await?;
        let parsed = self.parser.parse(&upload.content)?;
        let mapping = ColumnMapper::resolve(&parsed.header, upload.import_type);

        if !mapping.has_name() {
            log_warn!(
                "No name column in '{}'; all {} row(s) will fail",
                upload.file_name,
                parsed.total_records()
            );
        }

        Ok(PreparedImport {
            owner_id: user.id,
            file_name: upload.file_name.clone(),
            import_name: upload.resolved_import_name(),
            import_type: upload.import_type,
            parsed,
            mapping,
        })
    }

    pub fn executor_for(&self, prepared: &PreparedImport) -> ImportExecutor {
        ImportExecutor::new(
            Arc::clone(&self.store),
            prepared.import_type,
            prepared.owner_id,
        )
    }

    /// Insert every data row; failures are counted and the loop continues
    pub async fn execute_rows(&self, prepared: &PreparedImport) -> ImportRun {
        let timer = TimedOperation::new("execute_import_rows");
        let executor = self.executor_for(prepared);
        let total = prepared.total_records();

        let executor = &executor;
        let mapping = &prepared.mapping;
        let file_name = prepared.file_name.as_str();
        // Collected up front so the future stays `Send` inside `tokio::spawn`
        let row_imports: Vec<_> = prepared
            .parsed
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| async move {
                let row_number = index + 1;
                LogContext::import_progress(row_number, total, file_name);
                executor.import_single_row(row_number, mapping, row).await
            })
            .collect();

        let results = stream::iter(row_imports)
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut run = ImportRun::default();
        for result in results {
            match result {
                Ok(imported) => {
                    run.tally.record_success();
                    run.inserted.push(imported);
                }
                Err(failure) => {
                    run.tally.record_failure();
                    run.failures.push(failure);
                }
            }
        }
        run.inserted.sort_by_key(|row| row.row_number);
        run.failures.sort_by_key(|row| row.row_number);

        timer.finish_with_info(&format!(
            "{} inserted, {} failed",
            run.tally.successful, run.tally.failed
        ));
        run
    }

    /// Synchronous pipeline ending in a `completed` summary row
    pub async fn run_import(&self, upload: ImportUpload) -> AppResult<ImportJob> {
        let prepared = self.prepare(&upload).await?;
        log_info!(
            "Importing {} row(s) from '{}' into {}",
            prepared.total_records(),
            prepared.file_name,
            prepared.import_type.target_table()
        );

        let run = self.execute_rows(&prepared).await;

        let summary = NewImportJob::completed(
            prepared.owner_id,
            &prepared.file_name,
            &prepared.import_name,
            prepared.import_type,
            run.tally,
        );

        match self.repository.create(summary).await {
            Ok(job) => {
                LogContext::import_summary(
                    &job.file_name,
                    job.total_records,
                    job.successful_imports,
                    job.failed_imports,
                );
                Ok(job)
            }
            Err(e) => {
                LogContext::error_with_context(
                    &e,
                    &format!("Failed to write import summary for '{}'", prepared.file_name),
                );
                let removed = self
                    .executor_for(&prepared)
                    .remove_inserted(&run.inserted_ids())
                    .await;
                log_warn!(
                    "Removed {} of {} row(s) inserted by the failed import",
                    removed,
                    run.inserted.len()
                );
                Err(AppError::SummaryWriteError(e.to_string()))
            }
        }
    }
}
