//! Read-side query cache with change-driven invalidation.

mod listener;
mod query_cache;

pub use listener::ChangeListener;
pub use query_cache::{PollerGuard, QueryCache, QueryCacheError, QueryKey, QueryOptions};
