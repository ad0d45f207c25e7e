//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod changefeed;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use changefeed::{
    ChangeEvent, ChangeFeed, ChangeFeedError, ChangeHandler, ChangeOp, Subscription, Table,
};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    AuthorRepository, BaseRepository, CommentRepository, PostRepository, UserRepository,
    ViewRepository,
};
