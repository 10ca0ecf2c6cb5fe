use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::modules::client_imports::commands::{
    delete_import, import_file, import_statistics, list_imports, wait_for_import,
    ImportFileRequest, SubmitMode,
};
use crate::modules::client_imports::{ClientImportService, ImportJob, ImportType};

/// Single entry point for every CLI command
#[derive(Parser, Debug)]
#[command(name = "fieldcrm", version, about = "Import CRM clients from CSV files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a CSV file into customers, leads or projects
    Import {
        /// CSV file to import
        path: PathBuf,

        /// Target record type (customers, leads, projects)
        #[arg(short = 't', long = "type")]
        import_type: ImportType,

        /// Label shown in the imports list (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Return right away and insert rows in the background
        #[arg(short, long, default_value_t = false)]
        background: bool,

        /// With --background, wait until the import finishes
        #[arg(short, long, default_value_t = false)]
        wait: bool,

        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
    /// Create an import job that completes with randomized counts
    Simulate {
        path: PathBuf,

        #[arg(short = 't', long = "type")]
        import_type: ImportType,

        #[arg(short, long)]
        name: Option<String>,

        /// Wait until the job leaves processing
        #[arg(short, long, default_value_t = false)]
        wait: bool,

        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
    /// List imports, newest first
    ///
    /// The memory store starts empty on every run, so this only shows
    /// history with FIELDCRM_STORE=remote.
    List {
        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete one import record (needs FIELDCRM_STORE=remote to find past imports)
    Delete { id: Uuid },
    /// Show counts per status and row totals
    ///
    /// The memory store starts empty on every run, so this only shows
    /// history with FIELDCRM_STORE=remote.
    Stats,
}

/// Run one command and return what should be printed
pub async fn dispatch(command: Command, service: &ClientImportService) -> Result<String, String> {
    match command {
        Command::Import {
            path,
            import_type,
            name,
            background,
            wait,
            timeout,
        } => {
            let mode = if background {
                SubmitMode::Background
            } else {
                SubmitMode::Immediate
            };
            let job = submit(path, import_type, name, mode, service).await?;
            let job = if background && wait {
                wait_for_import(job.id, Duration::from_secs(timeout), service).await?
            } else {
                job
            };
            Ok(render_job(&job))
        }
        Command::Simulate {
            path,
            import_type,
            name,
            wait,
            timeout,
        } => {
            let job = submit(path, import_type, name, SubmitMode::Simulated, service).await?;
            let job = if wait {
                wait_for_import(job.id, Duration::from_secs(timeout), service).await?
            } else {
                job
            };
            Ok(render_job(&job))
        }
        Command::List { json } => {
            let jobs = list_imports(service).await?;
            if json {
                serde_json::to_string_pretty(&jobs).map_err(|e| e.to_string())
            } else {
                Ok(render_table(&jobs))
            }
        }
        Command::Delete { id } => {
            delete_import(id, service).await?;
            Ok(format!("Deleted import {}", id))
        }
        Command::Stats => {
            let stats = import_statistics(service).await?;
            Ok(format!(
                "imports: {} (processing {}, completed {}, failed {})\nrecords: {} total, {} imported, {} failed",
                stats.total_count,
                stats.processing_count,
                stats.completed_count,
                stats.failed_count,
                stats.records_total,
                stats.records_successful,
                stats.records_failed
            ))
        }
    }
}

async fn submit(
    path: PathBuf,
    import_type: ImportType,
    import_name: Option<String>,
    mode: SubmitMode,
    service: &ClientImportService,
) -> Result<ImportJob, String> {
    import_file(
        ImportFileRequest {
            path,
            import_type,
            import_name,
            mode,
        },
        service,
    )
    .await
}

fn render_job(job: &ImportJob) -> String {
    format!(
        "{}  {}  {}  {}  total={} ok={} failed={}",
        job.id,
        job.import_name,
        job.import_type,
        job.status,
        job.total_records,
        job.successful_imports,
        job.failed_imports
    )
}

fn render_table(jobs: &[ImportJob]) -> String {
    if jobs.is_empty() {
        return "No imports yet".to_string();
    }
    jobs.iter()
        .map(|job| {
            format!(
                "{}  {}",
                job.created_at.format("%Y-%m-%d %H:%M:%S"),
                render_job(job)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
