//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use marquee_core::domain::{Category, Comment, Post, PostPatch, User};
use marquee_core::error::RepoError;
use marquee_core::ports::{
    AuthorRepository, CommentRepository, PostRepository, UserRepository, ViewRepository,
};

use super::entity::author_profile::Entity as AuthorProfileEntity;
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity, Status};
use super::entity::post_view::{self, Entity as PostViewEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL author profile repository.
pub type PostgresAuthorRepository = PostgresBaseRepository<AuthorProfileEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL view record repository.
pub type PostgresViewRepository = PostgresBaseRepository<PostViewEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_by_category(&self, category: Category) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Status.eq(Status::Published))
            .filter(post::Column::Category.eq(post::Category::from(category)))
            .order_by_desc(post::Column::Date)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_featured(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Status.eq(Status::Published))
            .filter(post::Column::Featured.eq(true))
            .order_by_desc(post::Column::Date)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_popular(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Status.eq(Status::Published))
            .filter(post::Column::Popular.eq(true))
            .order_by_desc(post::Column::Date)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_scheduled(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Status.eq(Status::Scheduled))
            .order_by_asc(post::Column::ScheduledDate)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, patch: &PostPatch) -> Result<Option<Post>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
        else {
            return Ok(None);
        };

        // Merge in the domain so the patch semantics stay in one place,
        // then write the whole row back.
        let mut current: Post = model.into();
        current.apply(patch);

        let active: post::ActiveModel = current.into();
        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(Some(updated.into()))
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ViewRepository for PostgresViewRepository {
    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        PostViewEntity::find()
            .filter(post_view::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))
    }
}
