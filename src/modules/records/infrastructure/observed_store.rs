/// Decorator that publishes every successful write to a change feed
///
/// Wraps any `RecordStore`, so listeners get notified the same way whether
/// the rows live in memory or in the hosted backend.
use crate::modules::records::domain::record::record_id;
use crate::modules::records::domain::{
    ChangeEvent, ChangeKind, QueryFilter, Record, RecordStore,
};
use crate::modules::records::infrastructure::change_feed::ChangeFeed;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct ObservedRecordStore {
    inner: Arc<dyn RecordStore>,
    feed: Arc<ChangeFeed>,
}

impl ObservedRecordStore {
    pub fn new(inner: Arc<dyn RecordStore>, feed: Arc<ChangeFeed>) -> Self {
        Self { inner, feed }
    }

    pub fn feed(&self) -> Arc<ChangeFeed> {
        Arc::clone(&self.feed)
    }
}

#[async_trait]
impl RecordStore for ObservedRecordStore {
    async fn insert(&self, table: &str, record: Record) -> AppResult<Record> {
        let stored = self.inner.insert(table, record).await?;
        if let Ok(id) = record_id(&stored) {
            self.feed.publish(ChangeEvent::new(
                table,
                ChangeKind::Insert,
                id,
                Some(stored.clone()),
            ));
        }
        Ok(stored)
    }

    async fn query(&self, table: &str, filter: &QueryFilter) -> AppResult<Vec<Record>> {
        self.inner.query(table, filter).await
    }

    async fn update(&self, table: &str, id: Uuid, patch: Record) -> AppResult<()> {
        self.inner.update(table, id, patch.clone()).await?;
        self.feed
            .publish(ChangeEvent::new(table, ChangeKind::Update, id, Some(patch)));
        Ok(())
    }

    async fn update_where(
        &self,
        table: &str,
        id: Uuid,
        condition: &QueryFilter,
        patch: Record,
    ) -> AppResult<bool> {
        let updated = self
            .inner
            .update_where(table, id, condition, patch.clone())
            .await?;
        if updated {
            self.feed
                .publish(ChangeEvent::new(table, ChangeKind::Update, id, Some(patch)));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: Uuid) -> AppResult<()> {
        self.inner.delete(table, id).await?;
        self.feed
            .publish(ChangeEvent::new(table, ChangeKind::Delete, id, None));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::records::infrastructure::memory_store::MemoryRecordStore;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn test_writes_are_published_in_order() {
        let feed = Arc::new(ChangeFeed::default());
        let store = ObservedRecordStore::new(Arc::new(MemoryRecordStore::new()), feed.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = feed.subscribe("customers", move |event| {
            sink.lock().unwrap().push(event.kind);
        });

        let stored = store
            .insert("customers", json!({"name": "Alice"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        let id = record_id(&stored).unwrap();
        store
            .update("customers", id, json!({"phone": "555"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        store.delete("customers", id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        );
    }

    #[tokio::test]
    async fn test_failed_writes_are_not_published() {
        let feed = Arc::new(ChangeFeed::default());
        let store = ObservedRecordStore::new(Arc::new(MemoryRecordStore::new()), feed.clone());

        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();
        let _subscription = feed.subscribe("customers", move |_| {
            *sink.lock().unwrap() += 1;
        });

        assert!(store.delete("customers", Uuid::new_v4()).await.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
