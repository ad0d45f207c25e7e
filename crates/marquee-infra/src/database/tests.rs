use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use marquee_core::domain::{Category, Post, PostDraft, PostStatus};
use marquee_core::ports::BaseRepository;
use marquee_core::service::PostService;

use crate::changefeed::InMemoryChangeFeed;
use crate::database::entity::post;
use crate::database::memory::{InMemoryAuthorRepository, InMemoryPostRepository};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

fn draft(category: Category, content_len: usize) -> PostDraft {
    PostDraft {
        title: "Dune Part Three".to_owned(),
        excerpt: "First look at the final chapter".to_owned(),
        content: "x".repeat(content_len),
        category,
        image_url: "/covers/dune.jpg".to_owned(),
        read_time: None,
        featured: false,
        trending: false,
        popular: false,
        status: None,
        scheduled_date: None,
    }
}

fn memory_service() -> PostService {
    PostService::new(
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryAuthorRepository::new()),
        Arc::new(InMemoryChangeFeed::default()),
    )
}

#[tokio::test]
async fn post_lifecycle_create_publish_delete() {
    let service = memory_service();
    let author_id = Uuid::new_v4();

    // Create: defaults to draft, read_time estimated from content length.
    let created = service
        .create(draft(Category::Tech, 500), author_id, "Alex Reed")
        .await
        .unwrap();
    assert_eq!(created.post.status, PostStatus::Draft);
    assert_eq!(created.post.read_time, 1);
    assert_eq!(created.author.name, "Alex Reed");

    // Drafts stay invisible to the public category listing.
    let listed = service.list_by_category(Category::Tech).await.unwrap();
    assert!(listed.is_empty());

    // Publish: status flips, publication date stamped, now listed.
    let published = service.publish(created.post.id).await.unwrap().unwrap();
    assert_eq!(published.post.status, PostStatus::Published);

    let listed = service.list_by_category(Category::Tech).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].post.id, created.post.id);

    // Delete: gone from lookups and listings alike.
    assert!(service.delete(created.post.id).await.unwrap());
    assert!(service.get(created.post.id).await.unwrap().is_none());
    assert!(
        service
            .list()
            .await
            .unwrap()
            .iter()
            .all(|p| p.post.id != created.post.id)
    );
}

#[tokio::test]
async fn reader_listings_exclude_unpublished_posts() {
    let service = memory_service();
    let author_id = Uuid::new_v4();

    let mut featured_draft = draft(Category::Movie, 100);
    featured_draft.featured = true;
    let created = service
        .create(featured_draft, author_id, "Alex Reed")
        .await
        .unwrap();

    assert!(service.list_featured().await.unwrap().is_empty());
    assert!(service.list_published().await.unwrap().is_empty());

    service.publish(created.post.id).await.unwrap();

    assert_eq!(service.list_featured().await.unwrap().len(), 1);
    assert_eq!(service.list_published().await.unwrap().len(), 1);

    // The admin listing sees everything either way.
    assert_eq!(service.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn publish_due_promotes_only_elapsed_schedules() {
    let service = memory_service();
    let author_id = Uuid::new_v4();

    let mut scheduled = draft(Category::Game, 100);
    scheduled.status = Some(PostStatus::Scheduled);
    scheduled.scheduled_date = Some(Utc::now() + Duration::minutes(5));
    let due = service
        .create(scheduled, author_id, "Alex Reed")
        .await
        .unwrap();

    let mut far_out = draft(Category::Game, 100);
    far_out.status = Some(PostStatus::Scheduled);
    far_out.scheduled_date = Some(Utc::now() + Duration::days(7));
    let pending = service
        .create(far_out, author_id, "Alex Reed")
        .await
        .unwrap();

    // Sweep as if ten minutes have passed.
    let published = service
        .publish_due(Utc::now() + Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(published, vec![due.post.id]);

    let promoted = service.get(due.post.id).await.unwrap().unwrap();
    assert_eq!(promoted.post.status, PostStatus::Published);
    assert!(promoted.post.scheduled_date.is_none());

    let untouched = service.get(pending.post.id).await.unwrap().unwrap();
    assert_eq!(untouched.post.status, PostStatus::Scheduled);
}

#[tokio::test]
async fn missing_author_profile_falls_back_to_placeholder() {
    let posts = Arc::new(InMemoryPostRepository::new());
    let service = PostService::new(
        posts.clone(),
        Arc::new(InMemoryAuthorRepository::new()),
        Arc::new(InMemoryChangeFeed::default()),
    );

    // Insert directly, bypassing the profile upsert.
    let post = Post::new(Uuid::new_v4(), draft(Category::Comics, 100));
    posts.save(post.clone()).await.unwrap();

    let fetched = service.get(post.id).await.unwrap().unwrap();
    assert_eq!(fetched.author.name, "Unknown Author");
}

// `DatabaseConnection` is not `Clone` with the mock backend enabled, so the
// repositories share one handle instead of cloning the pool.
#[test]
fn repositories_share_one_connection_handle() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let _posts = PostgresPostRepository::new(db.clone());
    let _users = PostgresUserRepository::new(db.clone());

    assert_eq!(Arc::strong_count(&db), 3);
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let now = Utc::now();

    // Mock the query expectation
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            title: "Test Post".to_owned(),
            excerpt: "Excerpt".to_owned(),
            content: "Content".to_owned(),
            category: post::Category::Tech,
            image_url: "/cover.jpg".to_owned(),
            author_id,
            date: now.into(),
            read_time: 3,
            featured: false,
            trending: false,
            popular: false,
            status: post::Status::Published,
            scheduled_date: None,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    assert!(result.is_some());
    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.category, Category::Tech);
    assert_eq!(post.status, PostStatus::Published);
}
