use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Optional social links on an author profile, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

/// Author profile - metadata record for a content creator.
///
/// Keyed by the account id that created it; created lazily on first post
/// creation when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub bio: String,
    pub role: String,
    pub social: Option<SocialLinks>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthorProfile {
    /// Default profile created lazily for a first-time author.
    pub fn contributor(id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            avatar: "/placeholder.svg".to_owned(),
            bio: String::new(),
            role: "Contributor".to_owned(),
            social: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stand-in used when an author lookup fails; listing posts must never
    /// abort on a missing profile.
    pub fn placeholder(id: Uuid) -> Self {
        Self::contributor(id, "Unknown Author")
    }
}
