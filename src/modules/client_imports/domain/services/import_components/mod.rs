pub mod column_mapper;
pub mod csv_parser;
pub mod import_coordinator;
pub mod import_executor;
pub mod types;

pub use column_mapper::{CanonicalField, ColumnMapper, ColumnMapping};
pub use csv_parser::{CsvParser, ParsedCsv};
pub use import_coordinator::ImportCoordinator;
pub use import_executor::ImportExecutor;
pub use types::*;
