/// Domain entities for client imports
///
/// An import job is one CSV-to-records ingestion attempt plus the summary row
/// the CRM shows on its imports page.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Import status, stored lowercase in `client_imports.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }

    /// Only `processing` moves, and only into a terminal state
    pub fn can_transition_to(&self, next: ImportStatus) -> bool {
        matches!(
            (self, next),
            (ImportStatus::Processing, ImportStatus::Completed)
                | (ImportStatus::Processing, ImportStatus::Failed)
        )
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStatus::Processing => write!(f, "processing"),
            ImportStatus::Completed => write!(f, "completed"),
            ImportStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(ImportStatus::Processing),
            "completed" => Ok(ImportStatus::Completed),
            "failed" => Ok(ImportStatus::Failed),
            _ => Err(format!("Invalid import status: {}", s)),
        }
    }
}

/// What kind of CRM record each data row becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    Leads,
    Customers,
    Projects,
}

impl ImportType {
    /// Table receiving the imported rows
    pub fn target_table(&self) -> &'static str {
        match self {
            ImportType::Leads => "leads",
            ImportType::Customers => "customers",
            ImportType::Projects => "projects",
        }
    }
}

impl std::fmt::Display for ImportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.target_table())
    }
}

impl std::str::FromStr for ImportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leads" | "lead" => Ok(ImportType::Leads),
            "customers" | "customer" => Ok(ImportType::Customers),
            "projects" | "project" => Ok(ImportType::Projects),
            _ => Err(format!("Invalid import type: {}", s)),
        }
    }
}

/// Per-row outcome counts of one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTally {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
}

impl ImportTally {
    pub fn new(total: u32, successful: u32) -> Self {
        let successful = successful.min(total);
        Self {
            total,
            successful,
            failed: total - successful,
        }
    }

    pub fn record_success(&mut self) {
        self.total += 1;
        self.successful += 1;
    }

    pub fn record_failure(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    pub fn is_balanced(&self) -> bool {
        self.successful + self.failed == self.total
    }
}

/// Import job as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_name: String,
    pub import_name: String,
    pub import_type: ImportType,
    pub status: ImportStatus,
    pub total_records: u32,
    pub successful_imports: u32,
    pub failed_imports: u32,
    pub created_at: DateTime<Utc>,
}

impl ImportJob {
    pub fn tally(&self) -> ImportTally {
        ImportTally {
            total: self.total_records,
            successful: self.successful_imports,
            failed: self.failed_imports,
        }
    }

    /// Completed jobs must account for every record
    pub fn counts_consistent(&self) -> bool {
        match self.status {
            ImportStatus::Completed => self.tally().is_balanced(),
            _ => self.successful_imports + self.failed_imports <= self.total_records,
        }
    }
}

/// New job to be written (before the store assigns `id` / `created_at`)
#[derive(Debug, Clone, PartialEq)]
pub struct NewImportJob {
    pub owner_id: Uuid,
    pub file_name: String,
    pub import_name: String,
    pub import_type: ImportType,
    pub status: ImportStatus,
    pub tally: ImportTally,
}

impl NewImportJob {
    /// Job created up front and finished out of band
    pub fn processing(
        owner_id: Uuid,
        file_name: &str,
        import_name: &str,
        import_type: ImportType,
    ) -> Self {
        Self {
            owner_id,
            file_name: file_name.to_string(),
            import_name: import_name.to_string(),
            import_type,
            status: ImportStatus::Processing,
            tally: ImportTally::default(),
        }
    }

    /// Summary of an import that already ran
    pub fn completed(
        owner_id: Uuid,
        file_name: &str,
        import_name: &str,
        import_type: ImportType,
        tally: ImportTally,
    ) -> Self {
        Self {
            status: ImportStatus::Completed,
            tally,
            ..Self::processing(owner_id, file_name, import_name, import_type)
        }
    }
}

/// Label used when the uploader gives none: the file name minus its extension
pub fn default_import_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| file_name.to_string())
}
