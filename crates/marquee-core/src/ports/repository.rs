use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthorProfile, Category, Comment, Post, PostPatch, PostView, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique id. Absence is a valid outcome.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its id. Returns whether a row was removed.
    async fn delete(&self, id: ID) -> Result<bool, RepoError>;
}

/// Post repository. The `list_*` reader queries are published-only by
/// contract: unpublished posts are never exposed through them, regardless
/// of caller.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts regardless of status, newest created first.
    async fn list(&self) -> Result<Vec<Post>, RepoError>;

    /// Published posts in a category, newest published first.
    async fn list_by_category(&self, category: Category) -> Result<Vec<Post>, RepoError>;

    /// Published posts flagged featured, newest published first.
    async fn list_featured(&self) -> Result<Vec<Post>, RepoError>;

    /// Published posts flagged popular, newest published first.
    async fn list_popular(&self) -> Result<Vec<Post>, RepoError>;

    /// Scheduled posts ordered by scheduled date.
    async fn list_scheduled(&self) -> Result<Vec<Post>, RepoError>;

    /// Partial update: only fields present in the patch are written.
    /// Returns the updated row, or `None` when the id is unknown.
    async fn update(&self, id: Uuid, patch: &PostPatch) -> Result<Option<Post>, RepoError>;
}

/// Author profile repository, keyed by the owning account id.
#[async_trait]
pub trait AuthorRepository: BaseRepository<AuthorProfile, Uuid> {}

/// Comment repository. Append-only: insert via `save`, no update path.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, newest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

/// View record repository. Append-only.
#[async_trait]
pub trait ViewRepository: BaseRepository<PostView, Uuid> {
    /// Number of recorded views for a post.
    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}
