//! Domain entities - the core business objects.

mod category;
mod comment;
mod post;
mod profile;
mod user;

pub mod slug;

pub use category::{Category, CategoryCount};
pub use comment::{Comment, CommentWithAuthor};
pub use post::{POSTS_PER_PAGE, Post, PostWithAuthor, RECENT_FEED_SIZE};
pub use profile::{DEFAULT_AVATAR, Profile};
pub use user::{CONTENT_AUTHOR_GRANT, User};
