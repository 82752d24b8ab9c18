use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Posts shown per page on list views.
pub const POSTS_PER_PAGE: u64 = 6;

/// Posts in the most-recent sidebar feed.
pub const RECENT_FEED_SIZE: u64 = 3;

/// Post entity - a published article.
///
/// The slug is derived from the title once, at creation, and never changes
/// afterwards. Category associations and comments live in their own
/// aggregates and are attached at the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(author_id: Uuid, title: String, slug: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            slug,
            content,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read model pairing a post with its author account.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: User,
}
