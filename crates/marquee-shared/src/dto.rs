//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::domain::{PostDraft, PostPatch};

/// Request to register an admin account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// Request to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Public account information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a post. The draft fields sit at the top level;
/// `author_name` names the profile to create on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(flatten)]
    pub draft: PostDraft,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// Partial update for a post; only present fields are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(flatten)]
    pub patch: PostPatch,
    #[serde(default)]
    pub author_name: Option<String>,
}

/// Request to (re)schedule a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_date: DateTime<Utc>,
}

/// Request to post a comment; the post id comes from the path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommentRequest {
    pub author_name: String,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub author_image: Option<String>,
    pub content: String,
}

/// Request to record a page view. Without a visitor token the server
/// generates one, so a reload counts as a fresh view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordViewRequest {
    #[serde(default)]
    pub viewer: Option<String>,
}

/// View count for a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewCountResponse {
    pub post_id: Uuid,
    pub count: u64,
}

/// Query string for the SEO report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoQuery {
    #[serde(default)]
    pub keyword: Option<String>,
}
