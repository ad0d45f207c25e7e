//! Change feed backends.
//!
//! The in-memory feed covers a single process; the Redis feed fans events
//! out across processes so every instance invalidates its own cache.

pub mod memory;
pub mod redis;

pub use memory::InMemoryChangeFeed;
pub use redis::{RedisChangeFeed, RedisConfig};
