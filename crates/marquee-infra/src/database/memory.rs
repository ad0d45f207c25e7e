//! In-memory repository implementations.
//!
//! Used when no `DATABASE_URL` is configured (local development without
//! Postgres) and as fixtures in service-level tests. Semantics match the
//! PostgreSQL repositories: same filters, same ordering.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use marquee_core::domain::{
    AuthorProfile, Category, Comment, Post, PostPatch, PostStatus, PostView, User,
};
use marquee_core::error::RepoError;
use marquee_core::ports::{
    AuthorRepository, BaseRepository, CommentRepository, PostRepository, UserRepository,
    ViewRepository,
};

/// In-memory post repository.
#[derive(Default)]
pub struct InMemoryPostRepository {
    rows: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, filter: F) -> Vec<Post>
    where
        F: Fn(&Post) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.collect(|_| true).await;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<Post>, RepoError> {
        let mut posts = self
            .collect(|p| p.status == PostStatus::Published && p.category == category)
            .await;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn list_featured(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts = self
            .collect(|p| p.status == PostStatus::Published && p.featured)
            .await;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn list_popular(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts = self
            .collect(|p| p.status == PostStatus::Published && p.popular)
            .await;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn list_scheduled(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.collect(|p| p.status == PostStatus::Scheduled).await;
        posts.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date));
        Ok(posts)
    }

    async fn update(&self, id: Uuid, patch: &PostPatch) -> Result<Option<Post>, RepoError> {
        let mut rows = self.rows.write().await;
        let Some(post) = rows.get_mut(&id) else {
            return Ok(None);
        };
        post.apply(patch);
        Ok(Some(post.clone()))
    }
}

/// In-memory author profile repository.
#[derive(Default)]
pub struct InMemoryAuthorRepository {
    rows: RwLock<HashMap<Uuid, AuthorProfile>>,
}

impl InMemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<AuthorProfile, Uuid> for InMemoryAuthorRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthorProfile>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: AuthorProfile) -> Result<AuthorProfile, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {}

/// In-memory comment repository.
#[derive(Default)]
pub struct InMemoryCommentRepository {
    rows: RwLock<HashMap<Uuid, Comment>>,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Comment) -> Result<Comment, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .rows
            .read()
            .await
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }
}

/// In-memory view record repository.
#[derive(Default)]
pub struct InMemoryViewRepository {
    rows: RwLock<HashMap<Uuid, PostView>>,
}

impl InMemoryViewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<PostView, Uuid> for InMemoryViewRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: PostView) -> Result<PostView, RepoError> {
        self.rows.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl ViewRepository for InMemoryViewRepository {
    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let count = self
            .rows
            .read()
            .await
            .values()
            .filter(|v| v.post_id == post_id)
            .count();
        Ok(count as u64)
    }
}

/// In-memory user repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        let mut rows = self.rows.write().await;
        let duplicate = rows
            .values()
            .any(|u| u.email == entity.email && u.id != entity.id);
        if duplicate {
            return Err(RepoError::Constraint("email already registered".to_owned()));
        }
        rows.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}
