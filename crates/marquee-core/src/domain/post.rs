use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// Editorial category of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movie,
    Game,
    Tech,
    Series,
    Comics,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 5] = [
        Category::Movie,
        Category::Game,
        Category::Tech,
        Category::Series,
        Category::Comics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Game => "game",
            Category::Tech => "tech",
            Category::Series => "series",
            Category::Comics => "comics",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Category::Movie),
            "game" => Ok(Category::Game),
            "tech" => Ok(Category::Tech),
            "series" => Ok(Category::Series),
            "comics" => Ok(Category::Comics),
            other => Err(DomainError::Validation(format!(
                "unknown category '{other}'"
            ))),
        }
    }
}

/// Lifecycle status of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

/// Post entity - a content article with lifecycle status and editorial flags.
///
/// The `featured`/`trending`/`popular` flags drive placement on the reader
/// site only; they carry no access-control meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    /// Markdown source; rendering happens client-side.
    pub content: String,
    pub category: Category,
    pub image_url: String,
    pub author_id: Uuid,
    /// Publication timestamp, re-stamped on publish.
    pub date: DateTime<Utc>,
    /// Estimated reading time in minutes.
    pub read_time: i32,
    pub featured: bool,
    pub trending: bool,
    pub popular: bool,
    pub status: PostStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Estimated reading time: one minute per thousand characters of Markdown.
pub(crate) fn estimate_read_time(content: &str) -> i32 {
    content.chars().count().div_ceil(1000) as i32
}

/// A scheduled post must carry a future scheduled date; any other status
/// must not carry one at all.
pub(crate) fn check_schedule(
    status: PostStatus,
    scheduled_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    match (status, scheduled_date) {
        (PostStatus::Scheduled, None) => Err(DomainError::Validation(
            "a scheduled post requires a scheduled_date".into(),
        )),
        (PostStatus::Scheduled, Some(when)) if when <= now => Err(DomainError::Validation(
            "scheduled_date must be in the future".into(),
        )),
        (PostStatus::Draft | PostStatus::Published, Some(_)) => Err(DomainError::Validation(
            "scheduled_date is only valid on a scheduled post".into(),
        )),
        _ => Ok(()),
    }
}

impl Post {
    /// Create a new post from a validated draft.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            excerpt: draft.excerpt,
            read_time: draft
                .read_time
                .unwrap_or_else(|| estimate_read_time(&draft.content)),
            content: draft.content,
            category: draft.category,
            image_url: draft.image_url,
            author_id,
            date: now,
            featured: draft.featured,
            trending: draft.trending,
            popular: draft.popular,
            status: draft.status.unwrap_or_default(),
            scheduled_date: draft.scheduled_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to published, stamping the publication date with the
    /// publish instant and dropping any leftover schedule.
    pub fn publish(&mut self) {
        self.status = PostStatus::Published;
        self.date = Utc::now();
        self.scheduled_date = None;
    }

    /// Re-check the status/scheduled_date invariant, e.g. after merging a
    /// patch.
    pub fn validate_schedule(&self) -> Result<(), DomainError> {
        check_schedule(self.status, self.scheduled_date, Utc::now())
    }

    /// Apply a partial update. Only fields present in the patch are written.
    pub fn apply(&mut self, patch: &PostPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(excerpt) = &patch.excerpt {
            self.excerpt = excerpt.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = image_url.clone();
        }
        if let Some(read_time) = patch.read_time {
            self.read_time = read_time;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(trending) = patch.trending {
            self.trending = trending;
        }
        if let Some(popular) = patch.popular {
            self.popular = popular;
        }
        if let Some(status) = patch.status {
            self.status = status;
            if status == PostStatus::Published {
                self.date = Utc::now();
                self.scheduled_date = None;
            }
        }
        if let Some(scheduled_date) = patch.scheduled_date {
            self.scheduled_date = scheduled_date;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a post. Everything optional falls back to a default:
/// status to draft, read_time to the content-length estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: Category,
    pub image_url: String,
    #[serde(default)]
    pub read_time: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be empty".into()));
        }
        check_schedule(
            self.status.unwrap_or_default(),
            self.scheduled_date,
            Utc::now(),
        )
    }
}

/// Partial update for a post. `scheduled_date` is doubly optional so a patch
/// can distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub image_url: Option<String>,
    pub read_time: Option<i32>,
    pub featured: Option<bool>,
    pub trending: Option<bool>,
    pub popular: Option<bool>,
    pub status: Option<PostStatus>,
    #[serde(default, with = "double_option")]
    pub scheduled_date: Option<Option<DateTime<Utc>>>,
}

impl PostPatch {
    /// Patch that publishes a post.
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Self::default()
        }
    }
}

/// Serde helper keeping `Option<Option<T>>` round-trippable: a missing field
/// deserializes to `None`, an explicit `null` to `Some(None)`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> PostDraft {
        PostDraft {
            title: "Test Post".to_owned(),
            excerpt: "An excerpt".to_owned(),
            content: "x".repeat(500),
            category: Category::Tech,
            image_url: "/cover.jpg".to_owned(),
            read_time: None,
            featured: false,
            trending: false,
            popular: false,
            status: None,
            scheduled_date: None,
        }
    }

    #[test]
    fn new_post_defaults_to_draft() {
        let post = Post::new(Uuid::new_v4(), draft());
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[test]
    fn read_time_is_one_minute_per_thousand_chars() {
        let post = Post::new(Uuid::new_v4(), draft());
        assert_eq!(post.read_time, 1);

        assert_eq!(estimate_read_time(""), 0);
        assert_eq!(estimate_read_time(&"x".repeat(1000)), 1);
        assert_eq!(estimate_read_time(&"x".repeat(1001)), 2);
        assert_eq!(estimate_read_time(&"x".repeat(3500)), 4);
    }

    #[test]
    fn explicit_read_time_wins_over_estimate() {
        let mut d = draft();
        d.read_time = Some(12);
        let post = Post::new(Uuid::new_v4(), d);
        assert_eq!(post.read_time, 12);
    }

    #[test]
    fn publish_stamps_date_and_clears_schedule() {
        let mut post = Post::new(Uuid::new_v4(), draft());
        post.scheduled_date = Some(Utc::now() + Duration::days(1));
        let before = post.date;

        std::thread::sleep(std::time::Duration::from_millis(5));
        post.publish();

        assert_eq!(post.status, PostStatus::Published);
        assert!(post.date > before);
        assert!(post.scheduled_date.is_none());
    }

    #[test]
    fn scheduled_draft_requires_future_date() {
        let mut d = draft();
        d.status = Some(PostStatus::Scheduled);
        assert!(d.validate().is_err());

        d.scheduled_date = Some(Utc::now() - Duration::hours(1));
        assert!(d.validate().is_err());

        d.scheduled_date = Some(Utc::now() + Duration::hours(1));
        assert!(d.validate().is_ok());
    }

    #[test]
    fn non_scheduled_draft_rejects_scheduled_date() {
        let mut d = draft();
        d.scheduled_date = Some(Utc::now() + Duration::hours(1));
        assert!(d.validate().is_err());
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut post = Post::new(Uuid::new_v4(), draft());
        let original_excerpt = post.excerpt.clone();

        post.apply(&PostPatch {
            title: Some("Renamed".to_owned()),
            featured: Some(true),
            ..PostPatch::default()
        });

        assert_eq!(post.title, "Renamed");
        assert!(post.featured);
        assert_eq!(post.excerpt, original_excerpt);
    }

    #[test]
    fn publish_patch_refreshes_date() {
        let mut post = Post::new(Uuid::new_v4(), draft());
        let before = post.date;

        std::thread::sleep(std::time::Duration::from_millis(5));
        post.apply(&PostPatch::published());

        assert_eq!(post.status, PostStatus::Published);
        assert!(post.date > before);
    }
}
