/// Row shapes of the `client_imports` table
use crate::modules::client_imports::domain::entities::{
    ImportJob, ImportStatus, ImportTally, ImportType, NewImportJob,
};
use crate::modules::records::domain::Record;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const CLIENT_IMPORTS_TABLE: &str = "client_imports";

pub const STATUS_COLUMN: &str = "status";

/// Row written when a job is created
#[derive(Serialize, Debug)]
pub struct NewClientImportRow {
    pub user_id: Uuid,
    pub file_name: String,
    pub import_name: String,
    pub import_type: String,
    pub status: String,
    pub total_records: u32,
    pub successful_imports: u32,
    pub failed_imports: u32,
}

impl From<&NewImportJob> for NewClientImportRow {
    fn from(job: &NewImportJob) -> Self {
        Self {
            user_id: job.owner_id,
            file_name: job.file_name.clone(),
            import_name: job.import_name.clone(),
            import_type: job.import_type.to_string(),
            status: job.status.to_string(),
            total_records: job.tally.total,
            successful_imports: job.tally.successful,
            failed_imports: job.tally.failed,
        }
    }
}

impl NewClientImportRow {
    pub fn into_record(self) -> AppResult<Record> {
        into_record(&self)
    }
}

/// Partial row applied by terminal writes
#[derive(Serialize, Debug)]
pub struct ClientImportStatusPatch {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_imports: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_imports: Option<u32>,
}

impl ClientImportStatusPatch {
    pub fn completed(tally: ImportTally) -> Self {
        Self {
            status: ImportStatus::Completed.to_string(),
            total_records: Some(tally.total),
            successful_imports: Some(tally.successful),
            failed_imports: Some(tally.failed),
        }
    }

    /// Counts written so far are left as they are
    pub fn failed() -> Self {
        Self {
            status: ImportStatus::Failed.to_string(),
            total_records: None,
            successful_imports: None,
            failed_imports: None,
        }
    }

    pub fn into_record(self) -> AppResult<Record> {
        into_record(&self)
    }
}

/// Row as read back from the store
#[derive(Deserialize, Debug, Clone)]
pub struct ClientImportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    #[serde(default)]
    pub import_name: Option<String>,
    pub import_type: String,
    pub status: String,
    #[serde(default)]
    pub total_records: i64,
    #[serde(default)]
    pub successful_imports: i64,
    #[serde(default)]
    pub failed_imports: i64,
    pub created_at: DateTime<Utc>,
}

impl ClientImportRow {
    pub fn from_record(record: Record) -> AppResult<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// Convert to domain ImportJob
    pub fn to_import_job(self) -> AppResult<ImportJob> {
        let import_type: ImportType = self
            .import_type
            .parse()
            .map_err(AppError::DatabaseError)?;
        let status: ImportStatus = self
            .status
            .parse()
            .map_err(AppError::DatabaseError)?;

        Ok(ImportJob {
            id: self.id,
            owner_id: self.user_id,
            import_name: self
                .import_name
                .unwrap_or_else(|| self.file_name.clone()),
            file_name: self.file_name,
            import_type,
            status,
            total_records: count(self.total_records),
            successful_imports: count(self.successful_imports),
            failed_imports: count(self.failed_imports),
            created_at: self.created_at,
        })
    }
}

fn count(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

fn into_record<T: Serialize>(row: &T) -> AppResult<Record> {
    match serde_json::to_value(row)? {
        Value::Object(record) => Ok(record),
        other => Err(AppError::SerializationError(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_row_columns() {
        let owner = Uuid::new_v4();
        let job = NewImportJob::completed(
            owner,
            "clients.csv",
            "clients",
            ImportType::Customers,
            ImportTally::new(3, 2),
        );

        let record = NewClientImportRow::from(&job).into_record().unwrap();

        assert_eq!(record["user_id"], json!(owner.to_string()));
        assert_eq!(record["import_type"], json!("customers"));
        assert_eq!(record["status"], json!("completed"));
        assert_eq!(record["failed_imports"], json!(1));
        assert!(!record.contains_key("id"));
    }

    #[test]
    fn test_failed_patch_keeps_counts() {
        let record = ClientImportStatusPatch::failed().into_record().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["status"], json!("failed"));
    }

    #[test]
    fn test_row_to_import_job() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let record = json!({
            "id": id.to_string(),
            "user_id": owner.to_string(),
            "file_name": "leads.csv",
            "import_name": null,
            "import_type": "leads",
            "status": "processing",
            "total_records": 0,
            "created_at": "2024-03-01T10:00:00.000000Z"
        })
        .as_object()
        .cloned()
        .unwrap();

        let job = ClientImportRow::from_record(record)
            .unwrap()
            .to_import_job()
            .unwrap();

        assert_eq!(job.id, id);
        assert_eq!(job.owner_id, owner);
        assert_eq!(job.import_name, "leads.csv");
        assert_eq!(job.status, ImportStatus::Processing);
        assert_eq!(job.successful_imports, 0);
    }

    #[test]
    fn test_unknown_import_type_is_rejected() {
        let record = json!({
            "id": Uuid::new_v4().to_string(),
            "user_id": Uuid::new_v4().to_string(),
            "file_name": "x.csv",
            "import_type": "csv",
            "status": "completed",
            "created_at": "2024-03-01T10:00:00Z"
        })
        .as_object()
        .cloned()
        .unwrap();

        let result = ClientImportRow::from_record(record).unwrap().to_import_job();
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}
