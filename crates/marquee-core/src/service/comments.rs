use std::sync::Arc;

use uuid::Uuid;

use crate::DomainError;
use crate::domain::{Comment, NewComment};
use crate::ports::{ChangeEvent, ChangeFeed, ChangeOp, CommentRepository};

/// Visitor comments. Append-only and open to anyone; the write path is rate
/// limited at the HTTP layer instead.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { comments, feed }
    }

    /// Comments on a post, newest first.
    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        Ok(self.comments.list_for_post(post_id).await?)
    }

    pub async fn add(&self, input: NewComment) -> Result<Comment, DomainError> {
        if input.author_name.trim().is_empty() {
            return Err(DomainError::Validation("author_name is required".into()));
        }
        if input.content.trim().is_empty() {
            return Err(DomainError::Validation("content is required".into()));
        }

        let comment = self.comments.save(Comment::new(input)).await?;

        let event = ChangeEvent::comment(ChangeOp::Insert, comment.id, comment.post_id);
        if let Err(e) = self.feed.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish comment event");
        }
        Ok(comment)
    }
}
