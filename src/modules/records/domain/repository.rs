/// Record store trait for table-based persistence
///
/// Every call is implicitly scoped to the authenticated owner for tables that
/// carry an owner column. Implementations enforce that scope, callers do not.
use crate::modules::records::domain::record::{QueryFilter, Record};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row and return it as stored (with `id` and `created_at`)
    async fn insert(&self, table: &str, record: Record) -> AppResult<Record>;

    /// Fetch the visible rows of a table matching the filter
    async fn query(&self, table: &str, filter: &QueryFilter) -> AppResult<Vec<Record>>;

    /// Apply a partial update to one row
    async fn update(&self, table: &str, id: Uuid, patch: Record) -> AppResult<()>;

    /// Apply a partial update only if the row still matches `condition`.
    ///
    /// The check and the write are a single store operation. Returns `false`
    /// when no visible row matched, whether missing or in another state.
    async fn update_where(
        &self,
        table: &str,
        id: Uuid,
        condition: &QueryFilter,
        patch: Record,
    ) -> AppResult<bool>;

    /// Delete one row
    async fn delete(&self, table: &str, id: Uuid) -> AppResult<()>;
}
