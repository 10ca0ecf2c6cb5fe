//! In-process change feed
//!
//! Replaces global realtime listeners with explicit subscriptions: each
//! `subscribe` call returns a `Subscription` handle and the listener task is
//! released when the handle is dropped or `unsubscribe` is called.

use crate::modules::records::domain::ChangeEvent;
use crate::{log_debug, log_warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const DEFAULT_CAPACITY: usize = 256;

pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a committed change; a feed without listeners drops it
    pub fn publish(&self, event: ChangeEvent) {
        let table = event.table.clone();
        match self.sender.send(event) {
            Ok(listeners) => log_debug!("Change on '{}' delivered to {} listener(s)", table, listeners),
            Err(_) => log_debug!("Change on '{}' had no listeners", table),
        }
    }

    /// Invoke `on_change` for every change on `table` until the handle goes away
    ///
    /// Must be called inside a Tokio runtime. Events published after this
    /// returns are guaranteed to reach the callback.
    pub fn subscribe<F>(&self, table: &str, on_change: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let watched = table.to_string();
        let task_table = watched.clone();

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.table == task_table => on_change(event),
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log_warn!(
                            "Subscription on '{}' lagged, {} change(s) skipped",
                            task_table,
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        log_debug!("Subscribed to changes on '{}'", watched);

        Subscription {
            table: watched,
            handle: Some(handle),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Handle for an active subscription; dropping it unsubscribes
pub struct Subscription {
    table: String,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop listening and wait until the listener task is gone
    pub async fn unsubscribe(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        log_debug!("Unsubscribed from changes on '{}'", self.table);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::records::domain::ChangeKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_subscription_filters_by_table() {
        let feed = ChangeFeed::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        let _subscription = feed.subscribe("client_imports", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        feed.publish(ChangeEvent::new("client_imports", ChangeKind::Insert, Uuid::new_v4(), None));
        feed.publish(ChangeEvent::new("customers", ChangeKind::Insert, Uuid::new_v4(), None));
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_releases_listener() {
        let feed = ChangeFeed::default();
        let subscription = feed.subscribe("customers", |_| {});
        assert_eq!(feed.listener_count(), 1);

        drop(subscription);
        settle().await;

        assert_eq!(feed.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let feed = ChangeFeed::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        let subscription = feed.subscribe("leads", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(subscription.is_active());
        subscription.unsubscribe().await;

        feed.publish(ChangeEvent::new("leads", ChangeKind::Delete, Uuid::new_v4(), None));
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(feed.listener_count(), 0);
    }
}
