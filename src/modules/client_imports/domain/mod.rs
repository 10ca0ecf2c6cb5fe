pub mod entities;
pub mod repository;
pub mod services;

pub use entities::{
    default_import_name, ImportJob, ImportStatus, ImportTally, ImportType, NewImportJob,
};
pub use repository::{ClientImportRepository, ImportStatistics};
pub use services::import_components::{
    CanonicalField, ColumnMapper, ColumnMapping, CsvParser, ImportCoordinator, ImportExecutor,
    ImportRun, ImportUpload, ImportedRow, ParsedCsv, PreparedImport, RowImportError,
};
