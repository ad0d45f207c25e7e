//! Application state - shared across all handlers.

use std::sync::Arc;

use marquee_core::domain::Category;
use marquee_core::ports::{
    AuthorRepository, ChangeFeed, CommentRepository, PasswordService, PostRepository, RateLimiter,
    TokenService, UserRepository, ViewRepository,
};
use marquee_core::service::{CommentService, PostService, ViewService};
use marquee_infra::auth::{Argon2PasswordService, JwtTokenService};
use marquee_infra::cache::{ChangeListener, PollerGuard, QueryCache, QueryKey, QueryOptions};
use marquee_infra::changefeed::{InMemoryChangeFeed, RedisChangeFeed, RedisConfig};
use marquee_infra::database::{
    self, DatabaseConfig, InMemoryAuthorRepository, InMemoryCommentRepository,
    InMemoryPostRepository, InMemoryUserRepository, InMemoryViewRepository,
    PostgresAuthorRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresUserRepository, PostgresViewRepository,
};
use marquee_infra::rate_limit::{InMemoryRateLimiter, RateLimitConfig};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub views: ViewService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub cache: Arc<QueryCache>,
    pub limiter: Arc<dyn RateLimiter>,
    /// Keeps listing pollers and change-feed subscriptions alive for the
    /// life of the server.
    #[allow(dead_code)]
    guards: Arc<CacheGuards>,
}

#[allow(dead_code)]
struct CacheGuards {
    pollers: Vec<PollerGuard>,
    subscriptions: Vec<marquee_core::ports::Subscription>,
}

struct Repositories {
    posts: Arc<dyn PostRepository>,
    authors: Arc<dyn AuthorRepository>,
    comments: Arc<dyn CommentRepository>,
    views: Arc<dyn ViewRepository>,
    users: Arc<dyn UserRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        Self {
            posts: Arc::new(InMemoryPostRepository::new()),
            authors: Arc::new(InMemoryAuthorRepository::new()),
            comments: Arc::new(InMemoryCommentRepository::new()),
            views: Arc::new(InMemoryViewRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }
}

async fn init_repositories(config: Option<&DatabaseConfig>) -> Repositories {
    let Some(config) = config else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return Repositories::in_memory();
    };

    match database::connect(config).await {
        Ok(conn) => {
            let conn = Arc::new(conn);
            Repositories {
                posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                authors: Arc::new(PostgresAuthorRepository::new(conn.clone())),
                comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
                views: Arc::new(PostgresViewRepository::new(conn.clone())),
                users: Arc::new(PostgresUserRepository::new(conn)),
            }
        }
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            Repositories::in_memory()
        }
    }
}

async fn init_feed(redis_configured: bool) -> Arc<dyn ChangeFeed> {
    if redis_configured {
        match RedisChangeFeed::new(RedisConfig::from_env()).await {
            Ok(feed) => return Arc::new(feed),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Redis change feed unavailable, falling back to in-process feed"
                );
            }
        }
    }
    Arc::new(InMemoryChangeFeed::default())
}

fn init_limiter() -> Arc<dyn RateLimiter> {
    match InMemoryRateLimiter::from_env() {
        Ok(limiter) => Arc::new(limiter),
        Err(e) => {
            tracing::error!(error = %e, "Invalid rate limit config, using defaults");
            match InMemoryRateLimiter::new(RateLimitConfig::default()) {
                Ok(limiter) => Arc::new(limiter),
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter unavailable, failing open");
                    Arc::new(AllowAllLimiter)
                }
            }
        }
    }
}

/// Fail-open limiter used only when governor cannot be constructed.
struct AllowAllLimiter;

#[async_trait::async_trait]
impl RateLimiter for AllowAllLimiter {
    async fn check(
        &self,
        _key: &str,
    ) -> Result<marquee_core::ports::RateLimitResult, marquee_core::ports::RateLimitError> {
        Ok(marquee_core::ports::RateLimitResult {
            allowed: true,
            retry_after: std::time::Duration::ZERO,
        })
    }
}

/// Register the always-on listing queries and start their pollers.
async fn register_listings(cache: &Arc<QueryCache>, posts: &PostService) -> Vec<PollerGuard> {
    let mut pollers = Vec::new();

    let svc = posts.clone();
    if let Some(guard) = cache
        .register(QueryKey::AdminPosts, QueryOptions::admin(), move || {
            let svc = svc.clone();
            async move { svc.list().await }
        })
        .await
    {
        pollers.push(guard);
    }

    let svc = posts.clone();
    if let Some(guard) = cache
        .register(QueryKey::Posts, QueryOptions::listing(), move || {
            let svc = svc.clone();
            async move { svc.list_published().await }
        })
        .await
    {
        pollers.push(guard);
    }

    let svc = posts.clone();
    if let Some(guard) = cache
        .register(QueryKey::FeaturedPosts, QueryOptions::listing(), move || {
            let svc = svc.clone();
            async move { svc.list_featured().await }
        })
        .await
    {
        pollers.push(guard);
    }

    let svc = posts.clone();
    if let Some(guard) = cache
        .register(QueryKey::PopularPosts, QueryOptions::listing(), move || {
            let svc = svc.clone();
            async move { svc.list_popular().await }
        })
        .await
    {
        pollers.push(guard);
    }

    for category in Category::ALL {
        let svc = posts.clone();
        if let Some(guard) = cache
            .register(
                QueryKey::PostsByCategory(category),
                QueryOptions::listing(),
                move || {
                    let svc = svc.clone();
                    async move { svc.list_by_category(category).await }
                },
            )
            .await
        {
            pollers.push(guard);
        }
    }

    pollers
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = init_repositories(config.database.as_ref()).await;
        let feed = init_feed(config.redis_url.is_some()).await;

        let posts = PostService::new(repos.posts, repos.authors, feed.clone());
        let comments = CommentService::new(repos.comments, feed.clone());
        let views = ViewService::new(repos.views, feed.clone());

        let cache = QueryCache::new();
        let pollers = register_listings(&cache, &posts).await;

        let listener = ChangeListener::new(cache.clone(), feed);
        let subscriptions = match listener.watch_all().await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Change feed subscription failed; cache falls back to staleness windows only"
                );
                Vec::new()
            }
        };

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        tracing::info!("Application state initialized");

        Self {
            posts,
            comments,
            views,
            users: repos.users,
            tokens,
            passwords,
            cache,
            limiter: init_limiter(),
            guards: Arc::new(CacheGuards {
                pollers,
                subscriptions,
            }),
        }
    }
}
