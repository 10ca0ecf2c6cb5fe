/// Background finishers for import jobs
///
/// Both variants create the job in `processing`, hand it back right away and
/// move it to a terminal state from a spawned task:
/// - `ImportProgressReporter` fills in randomized counts after a random delay
/// - `BackgroundImportWorker` runs the real per-row pipeline
///
/// Tasks are tracked so `shutdown()` can cancel what is pending and wait for
/// the rest.
use crate::modules::client_imports::domain::entities::{ImportJob, ImportTally, NewImportJob};
use crate::modules::client_imports::domain::repository::ClientImportRepository;
use crate::modules::client_imports::domain::services::import_components::{
    ImportCoordinator, ImportUpload,
};
use crate::shared::config::SimulationConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::LogContext;
use crate::{log_debug, log_error, log_info, log_warn};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Shared cancellation token plus tracker for every spawned import task
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Tasks spawned and not yet finished
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub fn ensure_accepting(&self) -> AppResult<()> {
        if self.is_shutting_down() {
            return Err(AppError::InternalError(
                "Background imports are shutting down".to_string(),
            ));
        }
        Ok(())
    }

    pub fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task(self.token.clone()));
    }

    /// Cancel pending tasks and wait for all of them to return
    pub async fn shutdown(&self) {
        log_info!("Shutting down {} background import task(s)", self.pending());
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Randomized outcome of one simulated import, drawn up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    pub delay: Duration,
    pub tally: ImportTally,
}

impl SimulationPlan {
    pub fn draw<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> Self {
        let min_ms = config.min_delay.as_millis() as u64;
        let max_ms = (config.max_delay.as_millis() as u64).max(min_ms);
        let max_records = config.max_records.max(config.min_records);

        let total = rng.gen_range(config.min_records..=max_records);
        let successful = rng.gen_range(0..=total);

        Self {
            delay: Duration::from_millis(rng.gen_range(min_ms..=max_ms)),
            tally: ImportTally::new(total, successful),
        }
    }
}

/// Simulated progress reporter
pub struct ImportProgressReporter {
    repository: Arc<dyn ClientImportRepository>,
    tasks: BackgroundTasks,
    config: SimulationConfig,
}

impl ImportProgressReporter {
    pub fn new(
        repository: Arc<dyn ClientImportRepository>,
        tasks: BackgroundTasks,
        config: SimulationConfig,
    ) -> Self {
        Self {
            repository,
            tasks,
            config,
        }
    }

    /// Create the job in `processing` and schedule its completion
    pub async fn submit(&self, job: NewImportJob) -> AppResult<ImportJob> {
        self.tasks.ensure_accepting()?;

        let job = self
            .repository
            .create(NewImportJob::processing(
                job.owner_id,
                &job.file_name,
                &job.import_name,
                job.import_type,
            ))
            .await?;

        let plan = SimulationPlan::draw(&self.config, &mut rand::thread_rng());
        self.schedule(job.clone(), plan);
        Ok(job)
    }

    fn schedule(&self, job: ImportJob, plan: SimulationPlan) {
        log_debug!(
            "Import {} will complete in {}ms with {:?}",
            job.id,
            plan.delay.as_millis(),
            plan.tally
        );

        let repository = Arc::clone(&self.repository);
        self.tasks.spawn(move |token| async move {
            tokio::select! {
                _ = token.cancelled() => {
                    match repository.mark_failed(job.id).await {
                        Ok(true) => log_warn!("Import {} cancelled before completion", job.id),
                        Ok(false) => {}
                        Err(e) => LogContext::error_with_context(
                            &e,
                            &format!("Failed to mark cancelled import {} as failed", job.id),
                        ),
                    }
                }
                _ = tokio::time::sleep(plan.delay) => {
                    match repository.mark_completed(job.id, plan.tally).await {
                        Ok(true) => LogContext::import_summary(
                            &job.file_name,
                            plan.tally.total,
                            plan.tally.successful,
                            plan.tally.failed,
                        ),
                        Ok(false) => log_debug!("Import {} was already finished", job.id),
                        Err(e) => LogContext::error_with_context(
                            &e,
                            &format!("Failed to complete import {}", job.id),
                        ),
                    }
                }
            }
        });
    }
}

/// Runs the real import pipeline on a background task
pub struct BackgroundImportWorker {
    coordinator: ImportCoordinator,
    tasks: BackgroundTasks,
}

impl BackgroundImportWorker {
    pub fn new(coordinator: ImportCoordinator, tasks: BackgroundTasks) -> Self {
        Self { coordinator, tasks }
    }

    /// Authenticate and parse now, insert rows later
    pub async fn submit(&self, upload: ImportUpload) -> AppResult<ImportJob> {
        self.tasks.ensure_accepting()?;

        let prepared = self.coordinator.prepare(&upload).await?;
        let repository = self.coordinator.repository();

        let job = repository
            .create(NewImportJob::processing(
                prepared.owner_id,
                &prepared.file_name,
                &prepared.import_name,
                prepared.import_type,
            ))
            .await?;

        log_info!(
            "Queued background import {} ({} row(s))",
            job.id,
            prepared.total_records()
        );

        let coordinator = self.coordinator.clone();
        let job_id = job.id;
        // Row inserts are not interrupted by shutdown; it waits for them
        self.tasks.spawn(move |_token| async move {
            let run = coordinator.execute_rows(&prepared).await;

            match repository.mark_completed(job_id, run.tally).await {
                Ok(true) => LogContext::import_summary(
                    &prepared.file_name,
                    run.tally.total,
                    run.tally.successful,
                    run.tally.failed,
                ),
                Ok(false) => log_debug!("Import {} was already finished", job_id),
                Err(e) => {
                    log_error!("Failed to complete import {}: {}", job_id, e);
                    if let Err(e) = repository.mark_failed(job_id).await {
                        log_error!("Import {} is stuck in processing: {}", job_id, e);
                    }
                }
            }
        });

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(min_records: u32, max_records: u32) -> SimulationConfig {
        SimulationConfig {
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            min_records,
            max_records,
        }
    }

    #[test]
    fn test_plan_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = config(10, 100);

        for _ in 0..200 {
            let plan = SimulationPlan::draw(&config, &mut rng);
            assert!((10..=100).contains(&plan.tally.total));
            assert!(plan.tally.successful <= plan.tally.total);
            assert!(plan.tally.is_balanced());
            assert!(plan.delay >= Duration::from_millis(10));
            assert!(plan.delay <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_plan_with_fixed_total() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = SimulationPlan::draw(&config(5, 5), &mut rng);
        assert_eq!(plan.tally.total, 5);
    }

    #[tokio::test]
    async fn test_background_tasks_refuse_work_after_shutdown() {
        let tasks = BackgroundTasks::new();
        assert!(tasks.ensure_accepting().is_ok());

        tasks.shutdown().await;

        assert!(tasks.is_shutting_down());
        assert!(matches!(
            tasks.ensure_accepting(),
            Err(AppError::InternalError(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = done.clone();

        tasks.spawn(move |_token| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });
        tasks.shutdown().await;

        assert!(done.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(tasks.pending(), 0);
    }
}
