//! Persistence adapters: SeaORM/PostgreSQL repositories and in-memory
//! equivalents for running without a database.

pub mod connections;
pub mod entity;
pub mod memory;
pub mod postgres_base;
pub mod postgres_repo;

#[cfg(test)]
mod tests;

pub use connections::{DatabaseConfig, connect};
pub use memory::{
    InMemoryAuthorRepository, InMemoryCommentRepository, InMemoryPostRepository,
    InMemoryUserRepository, InMemoryViewRepository,
};
pub use postgres_repo::{
    PostgresAuthorRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresUserRepository, PostgresViewRepository,
};
