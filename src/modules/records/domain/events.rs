use crate::modules::records::domain::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed write on a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub record_id: Uuid,
    /// Full row for inserts, the applied patch for updates, nothing for deletes
    pub record: Option<Record>,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: &str, kind: ChangeKind, record_id: Uuid, record: Option<Record>) -> Self {
        Self {
            table: table.to_string(),
            kind,
            record_id,
            record,
            occurred_at: Utc::now(),
        }
    }
}
