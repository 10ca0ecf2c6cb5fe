use crate::modules::client_imports::domain::entities::{
    default_import_name, ImportTally, ImportType,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column_mapper::ColumnMapping;
use super::csv_parser::ParsedCsv;

/// File plus metadata handed in by the uploader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportUpload {
    pub file_name: String,
    pub import_name: Option<String>,
    pub import_type: ImportType,
    pub content: String,
}

impl ImportUpload {
    pub fn new(file_name: &str, import_type: ImportType, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.to_string(),
            import_name: None,
            import_type,
            content: content.into(),
        }
    }

    pub fn with_import_name(mut self, import_name: &str) -> Self {
        self.import_name = Some(import_name.to_string());
        self
    }

    /// Label stored on the job; blank names fall back to the file stem
    pub fn resolved_import_name(&self) -> String {
        self.import_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_import_name(&self.file_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedRow {
    /// 1-based data row number (header excluded)
    pub row_number: usize,
    pub record_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowImportError {
    pub row_number: usize,
    pub reason: String,
}

/// Authenticated, parsed and mapped upload, ready for row processing
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub owner_id: Uuid,
    pub file_name: String,
    pub import_name: String,
    pub import_type: ImportType,
    pub parsed: ParsedCsv,
    pub mapping: ColumnMapping,
}

impl PreparedImport {
    pub fn total_records(&self) -> usize {
        self.parsed.total_records()
    }
}

/// Outcome of the per-row loop
#[derive(Debug, Clone, Default)]
pub struct ImportRun {
    pub tally: ImportTally,
    pub inserted: Vec<ImportedRow>,
    pub failures: Vec<RowImportError>,
}

impl ImportRun {
    pub fn inserted_ids(&self) -> Vec<Uuid> {
        self.inserted.iter().map(|row| row.record_id).collect()
    }
}
