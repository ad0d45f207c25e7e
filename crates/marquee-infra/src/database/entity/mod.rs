//! SeaORM entities mirroring the Marquee schema.

pub mod author_profile;
pub mod comment;
pub mod post;
pub mod post_view;
pub mod user;
