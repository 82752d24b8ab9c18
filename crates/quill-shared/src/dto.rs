//! Data Transfer Objects - request/response types for the API.
//!
//! Ids and timestamps travel as strings (UUIDs and RFC 3339).

use serde::{Deserialize, Serialize};

/// Request to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// A user's public account information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// Account plus profile extension, as served to the profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub avatar: String,
    pub bio: String,
}

/// Full update of the account and profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
}

/// Post fields as submitted on create and update. Categories are referenced
/// by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Post row as it appears in list and search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub created_at: String,
}

/// Full post as served on the detail page and after mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author: String,
    pub categories: Vec<CategorySummary>,
    pub created_at: String,
    pub updated_at: String,
}

/// Comment submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPayload {
    pub body: String,
}

/// Comment as rendered under a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: String,
}

/// Category fields as submitted on create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub title: String,
}

/// Category reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub slug: String,
    pub title: String,
}

/// One row of the per-category post counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCountEntry {
    pub slug: String,
    pub title: String,
    pub post_count: i64,
}

/// Entry in the most-recent-posts feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentPostEntry {
    pub title: String,
    pub slug: String,
    pub created_at: String,
}

/// Context block every page view carries: the recent-posts feed and the
/// category counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidebar {
    pub most_recent: Vec<RecentPostEntry>,
    pub category_counts: Vec<CategoryCountEntry>,
}

/// Paginated post list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub sidebar: Sidebar,
}

/// Post detail page: the post, its comments, and the page context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub sidebar: Sidebar,
}

/// Category index page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategorySummary>,
    pub sidebar: Sidebar,
}

/// Posts filed under one category, paginated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPostsResponse {
    pub category: CategorySummary,
    pub posts: Vec<PostSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub sidebar: Sidebar,
}

/// Search results. Unpaginated: an empty query returns every post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<PostSummary>,
    pub sidebar: Sidebar,
}
