use crate::modules::client_imports::domain::entities::ImportType;
use crate::modules::records::domain::record::{record_id, OWNER_COLUMN};
use crate::modules::records::domain::{Record, RecordStore};
use crate::shared::errors::AppError;
use crate::shared::utils::logger::LogContext;
use crate::{log_debug, log_warn};

use serde_json::{Number, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::column_mapper::{CanonicalField, ColumnMapping};
use super::types::{ImportedRow, RowImportError};

const DEFAULT_LEAD_STATUS: &str = "New";
const DEFAULT_LEAD_PRIORITY: &str = "Medium";

/// Turns one data row into one target record and inserts it
#[derive(Clone)]
pub struct ImportExecutor {
    store: Arc<dyn RecordStore>,
    import_type: ImportType,
    owner_id: Uuid,
}

impl ImportExecutor {
    pub fn new(store: Arc<dyn RecordStore>, import_type: ImportType, owner_id: Uuid) -> Self {
        Self {
            store,
            import_type,
            owner_id,
        }
    }

    /// Target record for a row, or `None` when it has no name
    pub fn build_record(&self, mapping: &ColumnMapping, row: &[String]) -> Option<Record> {
        let name = mapping.value(CanonicalField::Name, row)?;

        let mut record = Record::new();
        record.insert("name".to_string(), Value::String(name.to_string()));

        for field in self.import_type.canonical_fields() {
            if *field == CanonicalField::Name {
                continue;
            }
            let value = match (field, mapping.value(*field, row)) {
                (CanonicalField::Value, Some(raw)) => numeric_or_text(raw),
                (_, Some(raw)) => Value::String(raw.to_string()),
                (_, None) => Value::Null,
            };
            record.insert(field.column().to_string(), value);
        }

        if self.import_type == ImportType::Leads {
            record.insert("status".to_string(), DEFAULT_LEAD_STATUS.into());
            record.insert("priority".to_string(), DEFAULT_LEAD_PRIORITY.into());
        }

        record.insert(OWNER_COLUMN.to_string(), self.owner_id.to_string().into());
        Some(record)
    }

    /// Insert a single row; every failure is reported, never raised
    pub async fn import_single_row(
        &self,
        row_number: usize,
        mapping: &ColumnMapping,
        row: &[String],
    ) -> Result<ImportedRow, RowImportError> {
        let Some(record) = self.build_record(mapping, row) else {
            log_debug!("Row {} has no name, skipping insert", row_number);
            return Err(RowImportError {
                row_number,
                reason: "Missing name".to_string(),
            });
        };

        let table = self.import_type.target_table();
        let inserted = self
            .store
            .insert(table, record)
            .await
            .and_then(|stored| record_id(&stored));

        match inserted {
            Ok(record_id) => Ok(ImportedRow {
                row_number,
                record_id,
            }),
            Err(e) => {
                let error = AppError::RowInsertError(e.to_string());
                LogContext::error_with_context(
                    &error,
                    &format!("Failed to insert row {} into {}", row_number, table),
                );
                Err(RowImportError {
                    row_number,
                    reason: error.to_string(),
                })
            }
        }
    }

    /// Best-effort removal of rows inserted by this run
    pub async fn remove_inserted(&self, record_ids: &[Uuid]) -> usize {
        let table = self.import_type.target_table();
        let mut removed = 0;
        for id in record_ids {
            match self.store.delete(table, *id).await {
                Ok(()) => removed += 1,
                Err(e) => log_warn!("Could not remove {} row {}: {}", table, id, e),
            }
        }
        removed
    }
}

fn numeric_or_text(raw: &str) -> Value {
    if let Ok(whole) = raw.parse::<i64>() {
        return Value::Number(whole.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
