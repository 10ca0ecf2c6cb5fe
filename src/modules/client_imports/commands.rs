use crate::modules::client_imports::domain::entities::{ImportJob, ImportType};
use crate::modules::client_imports::domain::repository::ImportStatistics;
use crate::modules::client_imports::domain::services::import_components::ImportUpload;
use crate::modules::client_imports::ClientImportService;
use crate::{log_debug, log_error, log_info, log_warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// How a submitted file is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    /// Insert every row before returning
    Immediate,
    /// Insert rows on a background task
    Background,
    /// Randomized counts after a delay, nothing is inserted
    Simulated,
}

#[derive(Debug, Deserialize)]
pub struct ImportFileRequest {
    pub path: PathBuf,
    pub import_type: ImportType,
    pub import_name: Option<String>,
    pub mode: SubmitMode,
}

/// Read a file from disk as UTF-8 text (invalid bytes are replaced)
pub async fn read_upload(
    path: &Path,
    import_type: ImportType,
    import_name: Option<String>,
) -> Result<ImportUpload, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ImportUpload {
        file_name,
        import_name,
        import_type,
        content: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

pub async fn import_file(
    request: ImportFileRequest,
    import_service: &ClientImportService,
) -> Result<ImportJob, String> {
    log_debug!(
        "import_file called for {} ({:?})",
        request.path.display(),
        request.mode
    );
    let upload = read_upload(&request.path, request.import_type, request.import_name).await?;

    let result = match request.mode {
        SubmitMode::Immediate => import_service.submit_import(upload).await,
        SubmitMode::Background => import_service.submit_background(upload).await,
        SubmitMode::Simulated => import_service.submit_simulated(upload).await,
    };

    match &result {
        Ok(job) => log_info!(
            "Import {} submitted - status: {}, total: {}, successful: {}, failed: {}",
            job.id,
            job.status,
            job.total_records,
            job.successful_imports,
            job.failed_imports
        ),
        Err(e) if e.is_rejection() => {
            log_warn!("Import of {} rejected: {}", request.path.display(), e)
        }
        Err(e) => log_error!("Import of {} failed: {}", request.path.display(), e),
    }

    result.map_err(|e| e.to_string())
}

/// Block until the job leaves `processing` or the timeout passes
pub async fn wait_for_import(
    job_id: Uuid,
    timeout: Duration,
    import_service: &ClientImportService,
) -> Result<ImportJob, String> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let subscription = import_service.subscribe_imports(move |event| {
        if event.record_id == job_id {
            let _ = sender.send(());
        }
    });

    let deadline = tokio::time::Instant::now() + timeout;
    let result = loop {
        let job = import_service
            .get_import(job_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("Import {} no longer exists", job_id))?;

        if job.status.is_terminal() {
            break Ok(job);
        }

        match tokio::time::timeout_at(deadline, receiver.recv()).await {
            Ok(Some(())) => continue,
            Ok(None) => break Err("Change feed closed".to_string()),
            Err(_) => {
                break Err(format!(
                    "Import {} still processing after {}s",
                    job_id,
                    timeout.as_secs()
                ))
            }
        }
    };

    subscription.unsubscribe().await;
    result
}

pub async fn list_imports(
    import_service: &ClientImportService,
) -> Result<Vec<ImportJob>, String> {
    import_service.list_imports().await.map_err(|e| e.to_string())
}

pub async fn delete_import(
    job_id: Uuid,
    import_service: &ClientImportService,
) -> Result<(), String> {
    import_service
        .delete_import(job_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn import_statistics(
    import_service: &ClientImportService,
) -> Result<ImportStatistics, String> {
    import_service
        .get_statistics()
        .await
        .map_err(|e| e.to_string())
}
