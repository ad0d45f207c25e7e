//! Redis change feed implementation.
//!
//! Events are serialized as JSON on one channel per table, so every
//! process sees every change and can invalidate its own cache.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use marquee_core::ports::{
    ChangeEvent, ChangeFeed, ChangeFeedError, ChangeHandler, Subscription, Table,
};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
}

impl RedisConfig {
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let connect_timeout = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));

        Self {
            url,
            connect_timeout,
        }
    }
}

fn channel_name(table: Table) -> String {
    format!("marquee:changes:{}", table.as_str())
}

/// Redis-backed change feed.
pub struct RedisChangeFeed {
    conn: ConnectionManager,
    client: Client,
}

impl RedisChangeFeed {
    pub async fn new(config: RedisConfig) -> Result<Self, ChangeFeedError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| ChangeFeedError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client.clone());
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| ChangeFeedError::Connection("Connection timed out".to_string()))?
            .map_err(|e| ChangeFeedError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis change feed");

        Ok(Self { conn, client })
    }
}

#[async_trait]
impl ChangeFeed for RedisChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> Result<(), ChangeFeedError> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| ChangeFeedError::Publish(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel_name(event.table), payload)
            .await
            .map_err(|e| ChangeFeedError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(
        &self,
        table: Table,
        post_id: Option<Uuid>,
        handler: ChangeHandler,
    ) -> Result<Subscription, ChangeFeedError> {
        let client = self.client.clone();
        let channel = channel_name(table);

        let handle = tokio::spawn(async move {
            let mut pubsub = match client.get_async_pubsub().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to get pubsub connection");
                    return;
                }
            };

            if let Err(e) = pubsub.subscribe(&channel).await {
                tracing::error!(channel = %channel, error = %e, "Failed to subscribe");
                return;
            }

            tracing::debug!(channel = %channel, "Subscribed to Redis channel");

            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get message payload");
                        continue;
                    }
                };

                let event: ChangeEvent = match serde_json::from_str(&payload) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(channel = %channel, error = %e, "Malformed change event");
                        continue;
                    }
                };

                if let Some(scope) = post_id {
                    if event.post_id != Some(scope) {
                        continue;
                    }
                }

                handler(event).await;
            }

            tracing::info!(channel = %channel, "Change feed connection closed");
        });

        Ok(Subscription::new(move || handle.abort()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::ports::ChangeOp;
    use tokio::sync::mpsc;

    async fn get_test_feed() -> Option<RedisChangeFeed> {
        let config = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
        };

        RedisChangeFeed::new(config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_change_feed() {
        let feed = match get_test_feed().await {
            Some(f) => f,
            None => return,
        };

        let (tx, mut rx) = mpsc::channel(1);

        let _sub = feed
            .subscribe(
                Table::Posts,
                None,
                Box::new(move |event| {
                    let tx = tx.clone();
                    Box::pin(async move {
                        let _ = tx.send(event).await;
                    })
                }),
            )
            .await
            .unwrap();

        // Give some time for subscription to stabilize
        tokio::time::sleep(Duration::from_millis(100)).await;

        let id = Uuid::new_v4();
        feed.publish(ChangeEvent::post(ChangeOp::Insert, id))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.id, id);
    }
}
