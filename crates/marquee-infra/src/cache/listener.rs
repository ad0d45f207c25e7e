//! Bridges the change feed into cache invalidation.
//!
//! Post events hit every post listing plus the post's detail entry; comment
//! and view events hit only the entries for their owning post.

use std::sync::Arc;

use marquee_core::ports::{ChangeEvent, ChangeFeed, ChangeFeedError, ChangeOp, Subscription, Table};

use super::query_cache::{QueryCache, QueryKey};

/// Subscribes to change feed tables and invalidates the matching cache
/// entries. The returned subscriptions must stay alive for as long as the
/// cache should track changes.
pub struct ChangeListener {
    cache: Arc<QueryCache>,
    feed: Arc<dyn ChangeFeed>,
}

impl ChangeListener {
    pub fn new(cache: Arc<QueryCache>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { cache, feed }
    }

    /// Invalidate the cache entries one change event touches.
    ///
    /// Post events invalidate coarsely: any post change may move a row in
    /// or out of any listing, so every listing key goes at once, plus the
    /// post's detail entry. A post delete goes further and evicts the
    /// post's on-demand registrations, since nothing will read them again.
    async fn apply(cache: &QueryCache, event: &ChangeEvent) {
        match event.table {
            Table::Posts => {
                cache.invalidate_where(QueryKey::is_post_listing).await;
                if event.op == ChangeOp::Delete {
                    cache.evict(&QueryKey::Post(event.id)).await;
                    cache.evict(&QueryKey::Comments(event.id)).await;
                    cache.evict(&QueryKey::ViewCount(event.id)).await;
                } else {
                    cache.invalidate(&QueryKey::Post(event.id)).await;
                }
            }
            Table::Comments => {
                if let Some(post_id) = event.post_id {
                    cache.invalidate(&QueryKey::Comments(post_id)).await;
                }
            }
            Table::PostViews => {
                if let Some(post_id) = event.post_id {
                    cache.invalidate(&QueryKey::ViewCount(post_id)).await;
                }
            }
        }
        tracing::debug!(
            table = %event.table.as_str(),
            id = %event.id,
            "Cache invalidated for change event"
        );
    }

    /// Watch one table, optionally scoped to a single post.
    pub async fn watch(
        &self,
        table: Table,
        post_id: Option<uuid::Uuid>,
    ) -> Result<Subscription, ChangeFeedError> {
        let cache = Arc::clone(&self.cache);
        self.feed
            .subscribe(
                table,
                post_id,
                Box::new(move |event| {
                    let cache = Arc::clone(&cache);
                    Box::pin(async move {
                        Self::apply(&cache, &event).await;
                    })
                }),
            )
            .await
    }

    /// Watch all tables unscoped; the standard server setup.
    pub async fn watch_all(&self) -> Result<Vec<Subscription>, ChangeFeedError> {
        let mut subscriptions = Vec::with_capacity(3);
        for table in [Table::Posts, Table::Comments, Table::PostViews] {
            subscriptions.push(self.watch(table, None).await?);
        }
        Ok(subscriptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use marquee_core::domain::Category;
    use marquee_core::ports::ChangeOp;
    use uuid::Uuid;

    use crate::cache::query_cache::{QueryCacheError, QueryOptions};
    use crate::changefeed::InMemoryChangeFeed;

    async fn prime(cache: &Arc<QueryCache>, key: QueryKey) {
        cache
            .register(key.clone(), QueryOptions::detail(), || async {
                Ok::<_, String>(0usize)
            })
            .await;
        let _: usize = cache.fetch(&key).await.unwrap();
        assert!(cache.contains(&key).await);
    }

    #[tokio::test]
    async fn post_event_invalidates_listings_and_detail_only() {
        let cache = QueryCache::new();
        let feed: Arc<dyn ChangeFeed> = Arc::new(InMemoryChangeFeed::default());
        let listener = ChangeListener::new(Arc::clone(&cache), Arc::clone(&feed));

        let post_id = Uuid::new_v4();
        let other_post = Uuid::new_v4();
        prime(&cache, QueryKey::Posts).await;
        prime(&cache, QueryKey::PostsByCategory(Category::Tech)).await;
        prime(&cache, QueryKey::Post(post_id)).await;
        prime(&cache, QueryKey::Post(other_post)).await;
        prime(&cache, QueryKey::Comments(post_id)).await;

        let _subs = listener.watch_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        feed.publish(ChangeEvent::post(ChangeOp::Update, post_id))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!cache.contains(&QueryKey::Posts).await);
        assert!(
            !cache
                .contains(&QueryKey::PostsByCategory(Category::Tech))
                .await
        );
        assert!(!cache.contains(&QueryKey::Post(post_id)).await);

        // Unrelated detail and comment entries survive.
        assert!(cache.contains(&QueryKey::Post(other_post)).await);
        assert!(cache.contains(&QueryKey::Comments(post_id)).await);
    }

    #[tokio::test]
    async fn post_delete_evicts_the_detail_registrations() {
        let cache = QueryCache::new();
        let feed: Arc<dyn ChangeFeed> = Arc::new(InMemoryChangeFeed::default());
        let listener = ChangeListener::new(Arc::clone(&cache), Arc::clone(&feed));

        let post_id = Uuid::new_v4();
        let other_post = Uuid::new_v4();
        prime(&cache, QueryKey::Post(post_id)).await;
        prime(&cache, QueryKey::Comments(post_id)).await;
        prime(&cache, QueryKey::ViewCount(post_id)).await;
        prime(&cache, QueryKey::Post(other_post)).await;

        let _subs = listener.watch_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        feed.publish(ChangeEvent::post(ChangeOp::Delete, post_id))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The deleted post's detail keys are gone registration and all, so
        // the maps do not accumulate one dead fetcher per deleted post.
        for key in [
            QueryKey::Post(post_id),
            QueryKey::Comments(post_id),
            QueryKey::ViewCount(post_id),
        ] {
            let refetch = cache.fetch::<usize>(&key).await;
            assert!(matches!(refetch, Err(QueryCacheError::NotRegistered(_))));
        }

        // Other posts keep their registrations.
        let _: usize = cache.fetch(&QueryKey::Post(other_post)).await.unwrap();
    }

    #[tokio::test]
    async fn comment_event_invalidates_only_that_posts_comments() {
        let cache = QueryCache::new();
        let feed: Arc<dyn ChangeFeed> = Arc::new(InMemoryChangeFeed::default());
        let listener = ChangeListener::new(Arc::clone(&cache), Arc::clone(&feed));

        let post_id = Uuid::new_v4();
        let other_post = Uuid::new_v4();
        prime(&cache, QueryKey::Comments(post_id)).await;
        prime(&cache, QueryKey::Comments(other_post)).await;
        prime(&cache, QueryKey::Posts).await;

        let _subs = listener.watch_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        feed.publish(ChangeEvent::comment(ChangeOp::Insert, Uuid::new_v4(), post_id))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!cache.contains(&QueryKey::Comments(post_id)).await);
        assert!(cache.contains(&QueryKey::Comments(other_post)).await);
        assert!(cache.contains(&QueryKey::Posts).await);
    }

    #[tokio::test]
    async fn view_event_invalidates_the_view_count() {
        let cache = QueryCache::new();
        let feed: Arc<dyn ChangeFeed> = Arc::new(InMemoryChangeFeed::default());
        let listener = ChangeListener::new(Arc::clone(&cache), Arc::clone(&feed));

        let post_id = Uuid::new_v4();
        prime(&cache, QueryKey::ViewCount(post_id)).await;

        let _subs = listener.watch_all().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        feed.publish(ChangeEvent::view(ChangeOp::Insert, Uuid::new_v4(), post_id))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!cache.contains(&QueryKey::ViewCount(post_id)).await);
    }
}
