//! Infrastructure adapters for the Marquee blog platform.
//!
//! Implements the ports declared in `marquee-core`: persistence (SeaORM /
//! in-memory), the query cache with change-driven invalidation, change feed
//! backends (in-process and Redis), token and password services, and rate
//! limiting.

pub mod auth;
pub mod cache;
pub mod changefeed;
pub mod database;
pub mod rate_limit;
