//! Services - the operations the HTTP surface and background jobs call.
//! Pure orchestration over the ports; no infrastructure types leak in here.

mod comments;
mod posts;
mod views;

pub use comments::CommentService;
pub use posts::{PostService, PostWithAuthor};
pub use views::ViewService;
