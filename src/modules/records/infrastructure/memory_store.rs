/// In-process record store backed by `DashMap`
///
/// Emulates the hosted backend's row-level security: a handle scoped to an
/// owner only sees and writes rows whose `user_id` matches that owner (rows
/// without an owner column stay visible). An unscoped handle acts as the
/// service role and sees everything.
use crate::modules::records::domain::record::{
    record_owner, CREATED_AT_COLUMN, ID_COLUMN, OWNER_COLUMN,
};
use crate::modules::records::domain::{QueryFilter, Record, RecordStore, SortDirection};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::LogContext;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    record: Record,
}

type Table = DashMap<Uuid, StoredRow>;

#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    tables: Arc<DashMap<String, Arc<Table>>>,
    sequence: Arc<AtomicU64>,
    owner: Option<Uuid>,
}

impl MemoryRecordStore {
    /// Unscoped store (service role)
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle over the same data, scoped to one owner
    pub fn as_owner(&self, owner: Uuid) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            sequence: Arc::clone(&self.sequence),
            owner: Some(owner),
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    /// Row count of a table regardless of scope
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.len()).unwrap_or(0)
    }

    fn table(&self, name: &str) -> Arc<Table> {
        Arc::clone(
            self.tables
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(DashMap::new()))
                .value(),
        )
    }

    fn is_visible(&self, record: &Record) -> bool {
        match (self.owner, record_owner(record)) {
            (None, _) => true,
            (Some(_), None) => !record.contains_key(OWNER_COLUMN),
            (Some(scope), Some(row_owner)) => scope == row_owner,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, table: &str, mut record: Record) -> AppResult<Record> {
        if let Some(scope) = self.owner {
            if let Some(value) = record.get(OWNER_COLUMN) {
                let row_owner = value.as_str().and_then(|raw| Uuid::parse_str(raw).ok());
                if row_owner != Some(scope) {
                    return Err(AppError::Unauthorized(format!(
                        "Row owner does not match the session on '{}'",
                        table
                    )));
                }
            }
        }

        let id = match record.get(ID_COLUMN).and_then(Value::as_str) {
            Some(raw) => Uuid::parse_str(raw)?,
            None => Uuid::new_v4(),
        };
        record.insert(ID_COLUMN.to_string(), Value::String(id.to_string()));
        record
            .entry(CREATED_AT_COLUMN.to_string())
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));

        let rows = self.table(table);
        if rows.contains_key(&id) {
            return Err(AppError::DatabaseError(format!(
                "Duplicate key {} in '{}'",
                id, table
            )));
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        rows.insert(
            id,
            StoredRow {
                seq,
                record: record.clone(),
            },
        );

        LogContext::store_operation("insert", table);
        Ok(record)
    }

    async fn query(&self, table: &str, filter: &QueryFilter) -> AppResult<Vec<Record>> {
        let rows = self.table(table);

        let mut matched: Vec<StoredRow> = rows
            .iter()
            .filter(|entry| self.is_visible(&entry.record) && filter.matches(&entry.record))
            .map(|entry| entry.value().clone())
            .collect();

        // Ties (and unordered queries) fall back to insertion order
        let newest_first = matches!(&filter.order_by, Some((_, SortDirection::Descending)));
        matched.sort_by(|a, b| {
            let by_seq = if newest_first {
                b.seq.cmp(&a.seq)
            } else {
                a.seq.cmp(&b.seq)
            };
            filter.compare(&a.record, &b.record).then(by_seq)
        });

        let mut records: Vec<Record> = matched.into_iter().map(|row| row.record).collect();
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }

        LogContext::store_operation("query", table);
        Ok(records)
    }

    async fn update(&self, table: &str, id: Uuid, patch: Record) -> AppResult<()> {
        check_patch(&patch)?;

        let rows = self.table(table);
        let mut row = rows
            .get_mut(&id)
            .filter(|row| self.is_visible(&row.record))
            .ok_or_else(|| AppError::NotFound(format!("No row {} in '{}'", id, table)))?;

        for (column, value) in patch {
            row.record.insert(column, value);
        }

        LogContext::store_operation("update", table);
        Ok(())
    }

    async fn update_where(
        &self,
        table: &str,
        id: Uuid,
        condition: &QueryFilter,
        patch: Record,
    ) -> AppResult<bool> {
        check_patch(&patch)?;

        let rows = self.table(table);
        // The shard stays locked from the condition check to the write
        let Some(mut row) = rows.get_mut(&id) else {
            return Ok(false);
        };
        if !self.is_visible(&row.record) || !condition.matches(&row.record) {
            return Ok(false);
        }

        for (column, value) in patch {
            row.record.insert(column, value);
        }

        LogContext::store_operation("conditional update", table);
        Ok(true)
    }

    async fn delete(&self, table: &str, id: Uuid) -> AppResult<()> {
        let rows = self.table(table);
        rows.remove_if(&id, |_, row| self.is_visible(&row.record))
            .ok_or_else(|| AppError::NotFound(format!("No row {} in '{}'", id, table)))?;

        LogContext::store_operation("delete", table);
        Ok(())
    }
}

fn check_patch(patch: &Record) -> AppResult<()> {
    for column in [ID_COLUMN, OWNER_COLUMN, CREATED_AT_COLUMN] {
        if patch.contains_key(column) {
            return Err(AppError::ValidationError(format!(
                "Column '{}' is immutable",
                column
            )));
        }
    }
    Ok(())
}
