/// Generic row shape exchanged with the record store
///
/// Rows are plain JSON objects so the same client can serve every table
/// (`customers`, `leads`, `client_imports`, ...).
use crate::shared::errors::{AppError, AppResult};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

pub type Record = Map<String, Value>;

/// Primary key column assigned by the store
pub const ID_COLUMN: &str = "id";

/// Owner column used for row-level isolation
pub const OWNER_COLUMN: &str = "user_id";

/// Creation timestamp column, set once by the store
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Extract the store-assigned identifier of a row
pub fn record_id(record: &Record) -> AppResult<Uuid> {
    let raw = record
        .get(ID_COLUMN)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::DatabaseError("Record is missing an id".to_string()))?;
    Ok(Uuid::parse_str(raw)?)
}

/// Extract the owner of a row, if the table carries one
pub fn record_owner(record: &Record) -> Option<Uuid> {
    record
        .get(OWNER_COLUMN)
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Equality filters plus optional ordering and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    pub equals: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.equals.push((column.to_string(), value.into()));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order_by = Some((column.to_string(), SortDirection::Ascending));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_by = Some((column.to_string(), SortDirection::Descending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when every equality filter holds for the row
    pub fn matches(&self, record: &Record) -> bool {
        self.equals
            .iter()
            .all(|(column, expected)| record.get(column) == Some(expected))
    }

    /// Compare two rows on the ordering column (missing values sort first)
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let Some((column, direction)) = &self.order_by else {
            return Ordering::Equal;
        };

        let ordering = compare_values(a.get(column), b.get(column));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        // RFC 3339 timestamps in the same offset sort lexicographically
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
