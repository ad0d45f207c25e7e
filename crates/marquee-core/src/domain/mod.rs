//! Domain entities - the content model of the platform.

mod author;
mod comment;
mod post;
mod user;
mod view;

pub mod seo;

pub use author::{AuthorProfile, SocialLinks};
pub use comment::{Comment, NewComment};
pub use post::{Category, Post, PostDraft, PostPatch, PostStatus};
pub use user::User;
pub use view::PostView;
