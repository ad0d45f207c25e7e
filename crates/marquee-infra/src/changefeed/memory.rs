//! In-memory change feed implementation.
//!
//! This is a fallback when Redis is not available.
//! Works within a single process only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use marquee_core::ports::{ChangeEvent, ChangeFeed, ChangeFeedError, ChangeHandler, Subscription, Table};

/// In-memory change feed, one broadcast channel per table.
pub struct InMemoryChangeFeed {
    channels: Arc<RwLock<HashMap<Table, broadcast::Sender<ChangeEvent>>>>,
    buffer_size: usize,
}

impl InMemoryChangeFeed {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer_size,
        }
    }
}

impl Default for InMemoryChangeFeed {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl ChangeFeed for InMemoryChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> Result<(), ChangeFeedError> {
        let channels = self.channels.read().await;

        if let Some(sender) = channels.get(&event.table) {
            // Ignore send errors (no subscribers)
            let _ = sender.send(event.clone());
            tracing::debug!(table = %event.table.as_str(), "Change event published");
        } else {
            tracing::debug!(table = %event.table.as_str(), "No subscribers for table");
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        table: Table,
        post_id: Option<Uuid>,
        handler: ChangeHandler,
    ) -> Result<Subscription, ChangeFeedError> {
        let mut channels = self.channels.write().await;

        // Create channel if it doesn't exist
        let sender = channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);

        let mut receiver = sender.subscribe();

        let handle = tokio::spawn(async move {
            tracing::debug!(table = %table.as_str(), "Subscribed to change feed");

            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Some(scope) = post_id {
                            if event.post_id != Some(scope) {
                                continue;
                            }
                        }
                        handler(event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        tracing::warn!(
                            table = %table.as_str(),
                            lagged = count,
                            "Change feed subscriber lagged behind"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!(table = %table.as_str(), "Change feed channel closed");
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(move || handle.abort()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use marquee_core::ports::ChangeOp;
    use tokio::sync::mpsc;

    fn forwarding_handler(tx: mpsc::Sender<ChangeEvent>) -> ChangeHandler {
        Box::new(move |event| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx.send(event).await;
            })
        })
    }

    #[tokio::test]
    async fn delivers_events_for_subscribed_table() {
        let feed = InMemoryChangeFeed::default();
        let (tx, mut rx) = mpsc::channel(4);

        let _sub = feed
            .subscribe(Table::Posts, None, forwarding_handler(tx))
            .await
            .unwrap();

        let id = Uuid::new_v4();
        feed.publish(ChangeEvent::post(ChangeOp::Insert, id))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.id, id);
        assert_eq!(received.table, Table::Posts);
    }

    #[tokio::test]
    async fn scoped_subscription_filters_other_posts() {
        let feed = InMemoryChangeFeed::default();
        let (tx, mut rx) = mpsc::channel(4);

        let watched = Uuid::new_v4();
        let _sub = feed
            .subscribe(Table::Comments, Some(watched), forwarding_handler(tx))
            .await
            .unwrap();

        feed.publish(ChangeEvent::comment(
            ChangeOp::Insert,
            Uuid::new_v4(),
            Uuid::new_v4(),
        ))
        .await
        .unwrap();
        feed.publish(ChangeEvent::comment(ChangeOp::Insert, Uuid::new_v4(), watched))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.post_id, Some(watched));

        // Only the scoped event came through.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_the_guard_stops_delivery() {
        let feed = InMemoryChangeFeed::default();
        let (tx, mut rx) = mpsc::channel(4);

        let sub = feed
            .subscribe(Table::Posts, None, forwarding_handler(tx))
            .await
            .unwrap();
        drop(sub);

        // Give the abort a moment to land.
        tokio::time::sleep(Duration::from_millis(50)).await;

        feed.publish(ChangeEvent::post(ChangeOp::Delete, Uuid::new_v4()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
