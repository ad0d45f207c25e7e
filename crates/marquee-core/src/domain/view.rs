use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// View record - one row per page view per post, keyed by a visitor token.
/// The view count of a post is the number of its rows; there is no
/// deduplication beyond the token the visitor supplies per load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub viewer_ip: String,
    pub viewed_at: DateTime<Utc>,
}

impl PostView {
    pub fn new(post_id: Uuid, viewer_ip: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            viewer_ip: viewer_ip.into(),
            viewed_at: Utc::now(),
        }
    }
}
