use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - belongs to exactly one post, written by any visitor.
/// Append-only: inserted and selected, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_name: String,
    pub author_email: Option<String>,
    pub author_image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for posting a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_name: String,
    pub author_email: Option<String>,
    pub author_image: Option<String>,
    pub content: String,
}

impl Comment {
    pub fn new(input: NewComment) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            post_id: input.post_id,
            author_name: input.author_name,
            author_email: input.author_email,
            author_image: input.author_image,
            content: input.content,
            created_at: now,
            updated_at: now,
        }
    }
}
