//! Post access layer - every post read and mutation goes through here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::DomainError;
use crate::domain::{AuthorProfile, Category, Post, PostDraft, PostPatch, PostStatus};
use crate::ports::{AuthorRepository, ChangeEvent, ChangeFeed, ChangeOp, PostRepository};

/// A post with its author profile resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorProfile,
}

/// Orchestrates post CRUD over the repository ports and notifies the change
/// feed after every successful mutation.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    authors: Arc<dyn AuthorRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        authors: Arc<dyn AuthorRepository>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            posts,
            authors,
            feed,
        }
    }

    /// All posts regardless of status, newest created first, authors
    /// resolved.
    pub async fn list(&self) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = self.posts.list().await?;
        Ok(self.resolve_authors(posts).await)
    }

    /// Single post lookup. Absence is a valid outcome, not an error.
    pub async fn get(&self, id: Uuid) -> Result<Option<PostWithAuthor>, DomainError> {
        match self.posts.find_by_id(id).await? {
            Some(post) => {
                let author = self.resolve_author(post.author_id).await;
                Ok(Some(PostWithAuthor { post, author }))
            }
            None => Ok(None),
        }
    }

    /// Published posts in a category. Drafts and scheduled posts are never
    /// exposed here, regardless of caller.
    pub async fn list_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = self.posts.list_by_category(category).await?;
        Ok(self.resolve_authors(posts).await)
    }

    pub async fn list_published(&self) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = self.posts.list().await?;
        let published = posts
            .into_iter()
            .filter(|p| p.status == PostStatus::Published)
            .collect();
        Ok(self.resolve_authors(published).await)
    }

    pub async fn list_featured(&self) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = self.posts.list_featured().await?;
        Ok(self.resolve_authors(posts).await)
    }

    pub async fn list_popular(&self) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = self.posts.list_popular().await?;
        Ok(self.resolve_authors(posts).await)
    }

    pub async fn list_scheduled(&self) -> Result<Vec<PostWithAuthor>, DomainError> {
        let posts = self.posts.list_scheduled().await?;
        Ok(self.resolve_authors(posts).await)
    }

    /// Create a post. The author profile is created first if this account
    /// has never published; status defaults to draft and read_time to the
    /// content-length estimate.
    pub async fn create(
        &self,
        draft: PostDraft,
        author_id: Uuid,
        author_name: &str,
    ) -> Result<PostWithAuthor, DomainError> {
        draft.validate()?;

        let author = self.ensure_author(author_id, author_name).await?;
        let post = self.posts.save(Post::new(author_id, draft)).await?;

        self.notify(ChangeEvent::post(ChangeOp::Insert, post.id))
            .await;
        Ok(PostWithAuthor { post, author })
    }

    /// Partial update. If the patch carries a new author name the profile is
    /// upserted first. Publishing is an update that sets status=published;
    /// the repository stamps the publication date.
    pub async fn update(
        &self,
        id: Uuid,
        patch: PostPatch,
        author_id: Uuid,
        author_name: Option<&str>,
    ) -> Result<Option<PostWithAuthor>, DomainError> {
        if let Some(name) = author_name {
            self.ensure_author(author_id, name).await?;
        }

        let Some(current) = self.posts.find_by_id(id).await? else {
            return Ok(None);
        };

        // Validate the invariant against the post-merge state.
        let mut merged = current.clone();
        merged.apply(&patch);
        merged.validate_schedule()?;

        self.apply_patch(id, &patch).await
    }

    /// Publish now: stamps the publication date and drops any schedule.
    pub async fn publish(&self, id: Uuid) -> Result<Option<PostWithAuthor>, DomainError> {
        self.apply_patch(id, &PostPatch::published()).await
    }

    /// Move a scheduled post (or schedule a draft) to a new future slot.
    pub async fn reschedule(
        &self,
        id: Uuid,
        when: DateTime<Utc>,
    ) -> Result<Option<PostWithAuthor>, DomainError> {
        if when <= Utc::now() {
            return Err(DomainError::Validation(
                "scheduled_date must be in the future".into(),
            ));
        }
        let patch = PostPatch {
            status: Some(PostStatus::Scheduled),
            scheduled_date: Some(Some(when)),
            ..PostPatch::default()
        };
        self.apply_patch(id, &patch).await
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let removed = self.posts.delete(id).await?;
        if removed {
            self.notify(ChangeEvent::post(ChangeOp::Delete, id)).await;
        }
        Ok(removed)
    }

    /// Publish every scheduled post whose slot has passed. Returns the ids
    /// that went live.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, DomainError> {
        let due: Vec<Uuid> = self
            .posts
            .list_scheduled()
            .await?
            .into_iter()
            .filter(|p| p.scheduled_date.is_some_and(|when| when <= now))
            .map(|p| p.id)
            .collect();

        let mut published = Vec::with_capacity(due.len());
        for id in due {
            if self.publish(id).await?.is_some() {
                published.push(id);
            }
        }
        Ok(published)
    }

    async fn apply_patch(
        &self,
        id: Uuid,
        patch: &PostPatch,
    ) -> Result<Option<PostWithAuthor>, DomainError> {
        let Some(post) = self.posts.update(id, patch).await? else {
            return Ok(None);
        };

        self.notify(ChangeEvent::post(ChangeOp::Update, id)).await;
        let author = self.resolve_author(post.author_id).await;
        Ok(Some(PostWithAuthor { post, author }))
    }

    /// Upsert-by-id: create the profile on first use, refresh the display
    /// name when it changed.
    async fn ensure_author(&self, id: Uuid, name: &str) -> Result<AuthorProfile, DomainError> {
        match self.authors.find_by_id(id).await? {
            Some(mut profile) => {
                if !name.is_empty() && profile.name != name {
                    profile.name = name.to_owned();
                    profile.updated_at = Utc::now();
                    profile = self.authors.save(profile).await?;
                }
                Ok(profile)
            }
            None => {
                let profile = AuthorProfile::contributor(id, name);
                Ok(self.authors.save(profile).await?)
            }
        }
    }

    async fn resolve_authors(&self, posts: Vec<Post>) -> Vec<PostWithAuthor> {
        let mut resolved = Vec::with_capacity(posts.len());
        for post in posts {
            let author = self.resolve_author(post.author_id).await;
            resolved.push(PostWithAuthor { post, author });
        }
        resolved
    }

    /// Author lookup with graceful fallback: a missing or failing profile
    /// never aborts a listing.
    async fn resolve_author(&self, author_id: Uuid) -> AuthorProfile {
        match self.authors.find_by_id(author_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => AuthorProfile::placeholder(author_id),
            Err(e) => {
                tracing::warn!(author_id = %author_id, error = %e, "Author lookup failed");
                AuthorProfile::placeholder(author_id)
            }
        }
    }

    /// Best-effort notification: consumers refetch idempotently, so a lost
    /// event is a latency problem, not a correctness one.
    async fn notify(&self, event: ChangeEvent) {
        if let Err(e) = self.feed.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish change event");
        }
    }
}
