//! Change feed port - row-change notifications between the write path and
//! whoever caches read results.
//!
//! Consumers treat events purely as invalidation triggers: the changed row
//! itself is never shipped, only enough identity to scope the invalidation.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tables that emit change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Posts,
    Comments,
    PostViews,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Posts => "posts",
            Table::Comments => "comments",
            Table::PostViews => "post_views",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// One row-level change. `post_id` carries the owning post for comment and
/// view rows so subscriptions can be scoped to a single post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
    /// Id of the changed row.
    pub id: Uuid,
    pub post_id: Option<Uuid>,
}

impl ChangeEvent {
    pub fn post(op: ChangeOp, id: Uuid) -> Self {
        Self {
            table: Table::Posts,
            op,
            id,
            post_id: None,
        }
    }

    pub fn comment(op: ChangeOp, id: Uuid, post_id: Uuid) -> Self {
        Self {
            table: Table::Comments,
            op,
            id,
            post_id: Some(post_id),
        }
    }

    pub fn view(op: ChangeOp, id: Uuid, post_id: Uuid) -> Self {
        Self {
            table: Table::PostViews,
            op,
            id,
            post_id: Some(post_id),
        }
    }
}

/// Handler invoked for each delivered event.
pub type ChangeHandler =
    Box<dyn Fn(ChangeEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Guard for an active subscription. Dropping it releases the subscription,
/// so a torn-down consumer cannot leave a dangling listener behind.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Change feed - abstraction over notification backends.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Publish a change event to its table's channel. Delivery is
    /// best-effort: consumers refetch idempotently, so a missed or
    /// duplicated event costs latency, not correctness.
    async fn publish(&self, event: ChangeEvent) -> Result<(), ChangeFeedError>;

    /// Subscribe to one table, optionally scoped by equality on the owning
    /// post id. The subscription lives until the returned guard drops.
    async fn subscribe(
        &self,
        table: Table,
        post_id: Option<Uuid>,
        handler: ChangeHandler,
    ) -> Result<Subscription, ChangeFeedError>;
}

/// Change feed errors.
#[derive(Debug, thiserror::Error)]
pub enum ChangeFeedError {
    #[error("Failed to publish: {0}")]
    Publish(String),

    #[error("Failed to subscribe: {0}")]
    Subscribe(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Subscriptions end up in state shared across server workers, so the
    // guard has to be shareable, not just sendable.
    #[test]
    fn subscription_is_shareable_across_threads() {
        fn assert_shareable<T: Send + Sync>() {}
        assert_shareable::<Subscription>();
    }

    #[test]
    fn dropping_the_guard_runs_cancel_once() {
        static CANCELLED: AtomicBool = AtomicBool::new(false);

        let sub = Subscription::new(|| {
            assert!(!CANCELLED.swap(true, Ordering::SeqCst));
        });
        drop(sub);
        assert!(CANCELLED.load(Ordering::SeqCst));
    }
}
