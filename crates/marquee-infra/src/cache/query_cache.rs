//! In-process query cache.
//!
//! Each cached query is registered once with a fetcher and a staleness
//! window, optionally with a polling interval. Reads inside the window are
//! served from memory; a stale read is served immediately from the cached
//! value while a background refresh runs; a miss fetches inline, with
//! concurrent misses for the same key coalesced into a single fetch.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use marquee_core::domain::Category;

/// Identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Published posts, reader-facing.
    Posts,
    /// All posts regardless of status, admin-facing.
    AdminPosts,
    PostsByCategory(Category),
    FeaturedPosts,
    PopularPosts,
    Post(Uuid),
    Comments(Uuid),
    ViewCount(Uuid),
}

impl QueryKey {
    /// Keys that serve post listings; invalidated together on any post
    /// change.
    pub fn is_post_listing(&self) -> bool {
        matches!(
            self,
            QueryKey::Posts
                | QueryKey::AdminPosts
                | QueryKey::PostsByCategory(_)
                | QueryKey::FeaturedPosts
                | QueryKey::PopularPosts
        )
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::Posts => write!(f, "posts"),
            QueryKey::AdminPosts => write!(f, "posts:admin"),
            QueryKey::PostsByCategory(category) => write!(f, "posts:category:{category}"),
            QueryKey::FeaturedPosts => write!(f, "posts:featured"),
            QueryKey::PopularPosts => write!(f, "posts:popular"),
            QueryKey::Post(id) => write!(f, "post:{id}"),
            QueryKey::Comments(post_id) => write!(f, "comments:{post_id}"),
            QueryKey::ViewCount(post_id) => write!(f, "views:{post_id}"),
        }
    }
}

/// Freshness policy for one registered query.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Age under which a cached value is served without refetching.
    pub staleness: Duration,
    /// Background refetch cadence; `None` disables polling.
    pub poll_interval: Option<Duration>,
}

impl QueryOptions {
    /// Admin listings: near-realtime so edits show up almost immediately.
    pub fn admin() -> Self {
        Self {
            staleness: Duration::from_secs(1),
            poll_interval: Some(Duration::from_secs(5)),
        }
    }

    /// Reader listings.
    pub fn listing() -> Self {
        Self {
            staleness: Duration::from_secs(5),
            poll_interval: Some(Duration::from_secs(10)),
        }
    }

    /// Single-entity queries registered on demand; no polling.
    pub fn detail() -> Self {
        Self {
            staleness: Duration::from_secs(5),
            poll_interval: None,
        }
    }
}

/// Query cache errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryCacheError {
    #[error("No query registered for key '{0}'")]
    NotRegistered(String),

    #[error("Query fetch failed: {0}")]
    Fetch(String),

    #[error("Cached value decode failed: {0}")]
    Decode(String),
}

type FetchFuture = Pin<Box<dyn Future<Output = Result<Value, String>> + Send>>;
type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

struct Entry {
    value: Value,
    fetched_at: Instant,
}

struct Registration {
    staleness: Duration,
    fetcher: Fetcher,
}

/// Guard for a background polling task; dropping it stops the poll loop.
pub struct PollerGuard {
    handle: JoinHandle<()>,
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for PollerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerGuard").finish_non_exhaustive()
    }
}

/// In-process query cache keyed by [`QueryKey`].
///
/// Values are stored as JSON so one cache instance can hold heterogeneous
/// result types; `fetch` decodes back into the caller's type.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    registrations: RwLock<HashMap<QueryKey, Registration>>,
    // One lock per key serializes fetches so concurrent misses coalesce.
    fetch_locks: Mutex<HashMap<QueryKey, Arc<Mutex<()>>>>,
}

impl QueryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            registrations: RwLock::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Register a query under a key. Re-registering replaces the fetcher,
    /// so on-demand registration per request is harmless.
    ///
    /// Returns a poll guard when the options ask for polling; the caller
    /// owns keeping it alive.
    pub async fn register<T, E, F, Fut>(
        self: &Arc<Self>,
        key: QueryKey,
        options: QueryOptions,
        fetch: F,
    ) -> Option<PollerGuard>
    where
        T: Serialize,
        E: std::fmt::Display,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let fetcher: Fetcher = Arc::new(move || {
            let fut = fetch();
            Box::pin(async move {
                let result = fut.await.map_err(|e| e.to_string())?;
                serde_json::to_value(result).map_err(|e| e.to_string())
            })
        });

        self.registrations.write().await.insert(
            key.clone(),
            Registration {
                staleness: options.staleness,
                fetcher,
            },
        );

        options.poll_interval.map(|interval| {
            let cache = Arc::clone(self);
            let poll_key = key.clone();
            let handle = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Err(e) = cache.refresh(&poll_key).await {
                        tracing::debug!(key = %poll_key, error = %e, "Poll refresh failed");
                    }
                }
            });
            PollerGuard { handle }
        })
    }

    /// Read a query result through the cache.
    ///
    /// Fresh hit: cached value. Stale hit: cached value now, refresh in the
    /// background. Miss: inline fetch, coalesced with concurrent misses.
    pub async fn fetch<T>(self: &Arc<Self>, key: &QueryKey) -> Result<T, QueryCacheError>
    where
        T: DeserializeOwned,
    {
        let staleness = {
            let registrations = self.registrations.read().await;
            registrations
                .get(key)
                .map(|r| r.staleness)
                .ok_or_else(|| QueryCacheError::NotRegistered(key.to_string()))?
        };

        if let Some(entry) = self.entries.read().await.get(key) {
            let value = entry.value.clone();
            if entry.fetched_at.elapsed() > staleness {
                let cache = Arc::clone(self);
                let refresh_key = key.clone();
                tokio::spawn(async move {
                    if let Err(e) = cache.refresh(&refresh_key).await {
                        tracing::debug!(key = %refresh_key, error = %e, "Background refresh failed");
                    }
                });
            }
            return decode(value);
        }

        let value = self.refresh(key).await?;
        decode(value)
    }

    /// Drop a cached value; the next read refetches.
    pub async fn invalidate(&self, key: &QueryKey) {
        if self.entries.write().await.remove(key).is_some() {
            tracing::debug!(key = %key, "Cache entry invalidated");
        }
    }

    /// Remove a key outright: cached value, registration, and fetch lock.
    ///
    /// Detail keys are registered on demand per request, so a deleted
    /// subject must take its registration with it or the map holds a dead
    /// fetcher for every id ever requested.
    pub async fn evict(&self, key: &QueryKey) {
        self.entries.write().await.remove(key);
        self.registrations.write().await.remove(key);
        self.fetch_locks.lock().await.remove(key);
        tracing::debug!(key = %key, "Cache key evicted");
    }

    /// Drop every cached value matching the predicate.
    pub async fn invalidate_where<F>(&self, predicate: F)
    where
        F: Fn(&QueryKey) -> bool,
    {
        self.entries.write().await.retain(|key, _| !predicate(key));
    }

    /// Whether a value is currently cached for the key.
    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    #[cfg(test)]
    async fn tracked_key_counts(&self) -> (usize, usize, usize) {
        (
            self.entries.read().await.len(),
            self.registrations.read().await.len(),
            self.fetch_locks.lock().await.len(),
        )
    }

    /// Run the registered fetcher and store the result. Serialized per key:
    /// whoever queues behind an in-flight fetch reuses its result instead
    /// of fetching again.
    async fn refresh(&self, key: &QueryKey) -> Result<Value, QueryCacheError> {
        let lock = {
            let mut locks = self.fetch_locks.lock().await;
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let _guard = lock.lock().await;

        let (staleness, fetcher) = {
            let registrations = self.registrations.read().await;
            let registration = registrations
                .get(key)
                .ok_or_else(|| QueryCacheError::NotRegistered(key.to_string()))?;
            (registration.staleness, Arc::clone(&registration.fetcher))
        };

        // A fetch that finished while we queued counts as ours.
        if let Some(entry) = self.entries.read().await.get(key) {
            if entry.fetched_at.elapsed() <= staleness {
                return Ok(entry.value.clone());
            }
        }

        let value = fetcher().await.map_err(QueryCacheError::Fetch)?;
        self.entries.write().await.insert(
            key.clone(),
            Entry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, QueryCacheError> {
    serde_json::from_value(value).map_err(|e| QueryCacheError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        counter: Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> Pin<Box<dyn Future<Output = Result<usize, String>> + Send>> {
        move || {
            let counter = counter.clone();
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
            })
        }
    }

    fn options(staleness: Duration) -> QueryOptions {
        QueryOptions {
            staleness,
            poll_interval: None,
        }
    }

    #[tokio::test]
    async fn fresh_hit_does_not_refetch() {
        let cache = QueryCache::new();
        let counter = Arc::new(AtomicUsize::new(0));
        cache
            .register(
                QueryKey::Posts,
                options(Duration::from_secs(60)),
                counting_fetcher(counter.clone(), Duration::ZERO),
            )
            .await;

        let first: usize = cache.fetch(&QueryKey::Posts).await.unwrap();
        let second: usize = cache.fetch(&QueryKey::Posts).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_hit_serves_old_value_and_refreshes_in_background() {
        let cache = QueryCache::new();
        let counter = Arc::new(AtomicUsize::new(0));
        cache
            .register(
                QueryKey::Posts,
                options(Duration::from_millis(20)),
                counting_fetcher(counter.clone(), Duration::ZERO),
            )
            .await;

        let first: usize = cache.fetch(&QueryKey::Posts).await.unwrap();
        assert_eq!(first, 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        // Stale read: still the old value, but a refresh kicks off.
        let stale: usize = cache.fetch(&QueryKey::Posts).await.unwrap();
        assert_eq!(stale, 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_coalesce_into_one_fetch() {
        let cache = QueryCache::new();
        let counter = Arc::new(AtomicUsize::new(0));
        cache
            .register(
                QueryKey::Posts,
                options(Duration::from_secs(60)),
                counting_fetcher(counter.clone(), Duration::from_millis(50)),
            )
            .await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.fetch::<usize>(&QueryKey::Posts).await.unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = QueryCache::new();
        let counter = Arc::new(AtomicUsize::new(0));
        cache
            .register(
                QueryKey::Posts,
                options(Duration::from_secs(60)),
                counting_fetcher(counter.clone(), Duration::ZERO),
            )
            .await;

        let first: usize = cache.fetch(&QueryKey::Posts).await.unwrap();
        cache.invalidate(&QueryKey::Posts).await;
        let second: usize = cache.fetch(&QueryKey::Posts).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn evict_releases_the_registration_and_lock() {
        let cache = QueryCache::new();

        // On-demand detail keys come and go with their subject; eviction
        // must leave no trace behind, or the maps grow with every id ever
        // requested.
        for _ in 0..50 {
            let key = QueryKey::Post(Uuid::new_v4());
            cache
                .register(key.clone(), options(Duration::from_secs(60)), || async {
                    Ok::<_, String>(0usize)
                })
                .await;
            let _: usize = cache.fetch(&key).await.unwrap();
            cache.evict(&key).await;

            let refetch = cache.fetch::<usize>(&key).await;
            assert!(matches!(refetch, Err(QueryCacheError::NotRegistered(_))));
        }

        assert_eq!(cache.tracked_key_counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn unregistered_key_is_an_error() {
        let cache = QueryCache::new();
        let result = cache.fetch::<usize>(&QueryKey::FeaturedPosts).await;
        assert!(matches!(result, Err(QueryCacheError::NotRegistered(_))));
    }

    #[tokio::test]
    async fn poller_keeps_the_entry_warm() {
        let cache = QueryCache::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = cache
            .register(
                QueryKey::Posts,
                QueryOptions {
                    staleness: Duration::from_millis(10),
                    poll_interval: Some(Duration::from_millis(25)),
                },
                counting_fetcher(counter.clone(), Duration::ZERO),
            )
            .await;
        assert!(guard.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(counter.load(Ordering::SeqCst) >= 2);
        assert!(cache.contains(&QueryKey::Posts).await);
    }
}
