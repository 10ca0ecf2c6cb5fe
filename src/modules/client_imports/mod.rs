/// Client import module
///
/// Turns uploaded CSV files into customer, lead or project records and keeps
/// one `client_imports` summary row per attempt:
/// - Domain: job entities, repository trait, parser / mapper / executor / coordinator
/// - Infrastructure: record-store backed repository
/// - Worker: simulated reporter and background pipeline
/// - Application: service facade used by the CLI
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;
pub mod worker;

// Re-exports for easy access
pub use application::ClientImportService;
pub use domain::{
    entities::{ImportJob, ImportStatus, ImportTally, ImportType, NewImportJob},
    repository::{ClientImportRepository, ImportStatistics},
    services::import_components::{ImportRun, ImportUpload, PreparedImport},
};
pub use infrastructure::ClientImportRepositoryImpl;
pub use worker::{BackgroundImportWorker, BackgroundTasks, ImportProgressReporter, SimulationPlan};
