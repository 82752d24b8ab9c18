use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryCount, Comment, CommentWithAuthor, Post, PostWithAuthor, Profile, User,
};
use crate::error::RepoError;

/// One page of query results plus the paging totals. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Whether the requested page points past the data. Page 1 is always in
    /// range so an empty store still serves an empty first page.
    pub fn is_out_of_range(&self) -> bool {
        self.page > 1 && self.page > self.total_pages
    }
}

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with account-lookup methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Overwrite a user and their profile in one transaction, so an account
    /// update is never half-applied.
    async fn update_with_profile(
        &self,
        user: User,
        profile: Profile,
    ) -> Result<(User, Profile), RepoError>;
}

/// Post repository: the read side of the content store plus the
/// multi-row writes that must stay atomic.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn find_by_slug_with_author(
        &self,
        slug: &str,
    ) -> Result<Option<PostWithAuthor>, RepoError>;

    /// Newest-first page over all posts.
    async fn page_all(&self, page: u64, per_page: u64) -> Result<Page<PostWithAuthor>, RepoError>;

    /// Newest-first page over the posts filed under one category.
    async fn page_by_category(
        &self,
        category_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<PostWithAuthor>, RepoError>;

    /// Posts whose title or content contains `term` case-insensitively,
    /// newest first and unpaginated; `None` returns every post.
    async fn search(&self, term: Option<&str>) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// The `limit` most recent posts.
    async fn recent(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Persist a post and its category associations atomically.
    async fn insert_with_categories(
        &self,
        post: Post,
        category_ids: &[Uuid],
    ) -> Result<Post, RepoError>;

    /// Overwrite a post and replace its category associations atomically.
    async fn update_with_categories(
        &self,
        post: Post,
        category_ids: &[Uuid],
    ) -> Result<Post, RepoError>;

    /// Categories the post is filed under, by title.
    async fn categories_of(&self, post_id: Uuid) -> Result<Vec<Category>, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// All categories, newest first.
    async fn list_all(&self) -> Result<Vec<Category>, RepoError>;

    /// Resolve a batch of slugs. Unknown slugs are simply absent from the
    /// result; callers compare lengths to detect them.
    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Category>, RepoError>;

    /// Post count per category, excluding categories with no posts.
    async fn counts(&self) -> Result<Vec<CategoryCount>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// All comments on a post, oldest first, each with its author.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError>;
}

/// Profile repository. Profiles are keyed by the owning user's id, so the
/// base CRUD surface is already the whole contract.
pub trait ProfileRepository: BaseRepository<Profile, Uuid> {}
