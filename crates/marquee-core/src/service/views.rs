use std::sync::Arc;

use uuid::Uuid;

use crate::DomainError;
use crate::domain::PostView;
use crate::ports::{ChangeEvent, ChangeFeed, ChangeOp, ViewRepository};

/// Page-view bookkeeping. Every recorded view inserts a fresh row; a reload
/// counts again. Whether that should dedup per session is an open product
/// question, so the behavior is kept as-is.
#[derive(Clone)]
pub struct ViewService {
    views: Arc<dyn ViewRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl ViewService {
    pub fn new(views: Arc<dyn ViewRepository>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { views, feed }
    }

    pub async fn record(&self, post_id: Uuid, viewer: &str) -> Result<PostView, DomainError> {
        let view = self.views.save(PostView::new(post_id, viewer)).await?;

        let event = ChangeEvent::view(ChangeOp::Insert, view.id, post_id);
        if let Err(e) = self.feed.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish view event");
        }
        Ok(view)
    }

    pub async fn count(&self, post_id: Uuid) -> Result<u64, DomainError> {
        Ok(self.views.count_for_post(post_id).await?)
    }
}
