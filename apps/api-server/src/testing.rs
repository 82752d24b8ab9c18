//! In-memory repository doubles backing the handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryCount, Comment, CommentWithAuthor, Post, PostWithAuthor, Profile, User, slug,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, Page, PasswordService, PostRepository,
    ProfileRepository, TokenService, UserRepository,
};
use quill_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

use crate::state::AppState;

/// Shared backing store for the repository doubles.
#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub profiles: Mutex<Vec<Profile>>,
    pub posts: Mutex<Vec<Post>>,
    pub categories: Mutex<Vec<Category>>,
    pub comments: Mutex<Vec<Comment>>,
    /// (post_id, category_id) association rows.
    pub links: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MemoryStore {
    fn author(&self, author_id: Uuid) -> Result<User, RepoError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == author_id)
            .cloned()
            .ok_or_else(|| RepoError::Query("author missing".to_string()))
    }

    fn posts_newest_first(&self) -> Vec<Post> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

fn page_of(rows: Vec<PostWithAuthor>, page: u64, per_page: u64) -> Page<PostWithAuthor> {
    let total_items = rows.len() as u64;
    let total_pages = total_items.div_ceil(per_page);
    let start = (page.saturating_sub(1) * per_page) as usize;
    let items = rows
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

pub struct MemoryUsers(pub Arc<MemoryStore>);
pub struct MemoryProfiles(pub Arc<MemoryStore>);
pub struct MemoryPosts(pub Arc<MemoryStore>);
pub struct MemoryCategories(pub Arc<MemoryStore>);
pub struct MemoryComments(pub Arc<MemoryStore>);

#[async_trait]
impl BaseRepository<User, Uuid> for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn insert(&self, entity: User) -> Result<User, RepoError> {
        let mut users = self.0.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == entity.username || u.email == entity.email)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        users.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: User) -> Result<User, RepoError> {
        let mut users = self.0.users.lock().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.0.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .0
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_with_profile(
        &self,
        user: User,
        profile: Profile,
    ) -> Result<(User, Profile), RepoError> {
        {
            let mut users = self.0.users.lock().unwrap();
            let slot = users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(RepoError::NotFound)?;
            *slot = user.clone();
        }
        {
            let mut profiles = self.0.profiles.lock().unwrap();
            let slot = profiles
                .iter_mut()
                .find(|p| p.user_id == profile.user_id)
                .ok_or(RepoError::NotFound)?;
            *slot = profile.clone();
        }
        Ok((user, profile))
    }
}

#[async_trait]
impl BaseRepository<Profile, Uuid> for MemoryProfiles {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self
            .0
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == id)
            .cloned())
    }

    async fn insert(&self, entity: Profile) -> Result<Profile, RepoError> {
        let mut profiles = self.0.profiles.lock().unwrap();
        if profiles.iter().any(|p| p.user_id == entity.user_id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        profiles.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Profile) -> Result<Profile, RepoError> {
        let mut profiles = self.0.profiles.lock().unwrap();
        let slot = profiles
            .iter_mut()
            .find(|p| p.user_id == entity.user_id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut profiles = self.0.profiles.lock().unwrap();
        let before = profiles.len();
        profiles.retain(|p| p.user_id != id);
        if profiles.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

impl ProfileRepository for MemoryProfiles {}

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPosts {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        if posts.iter().any(|p| p.slug == entity.slug) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        posts.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        let slot = posts
            .iter_mut()
            .find(|p| p.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.0.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        self.0.links.lock().unwrap().retain(|(p, _)| *p != id);
        self.0.comments.lock().unwrap().retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryPosts {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .0
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn find_by_slug_with_author(
        &self,
        slug: &str,
    ) -> Result<Option<PostWithAuthor>, RepoError> {
        let post = self.find_by_slug(slug).await?;
        match post {
            Some(post) => {
                let author = self.0.author(post.author_id)?;
                Ok(Some(PostWithAuthor { post, author }))
            }
            None => Ok(None),
        }
    }

    async fn page_all(&self, page: u64, per_page: u64) -> Result<Page<PostWithAuthor>, RepoError> {
        let rows = self
            .0
            .posts_newest_first()
            .into_iter()
            .map(|post| {
                let author = self.0.author(post.author_id)?;
                Ok(PostWithAuthor { post, author })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(page_of(rows, page, per_page))
    }

    async fn page_by_category(
        &self,
        category_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<PostWithAuthor>, RepoError> {
        let links = self.0.links.lock().unwrap().clone();
        let rows = self
            .0
            .posts_newest_first()
            .into_iter()
            .filter(|post| links.contains(&(post.id, category_id)))
            .map(|post| {
                let author = self.0.author(post.author_id)?;
                Ok(PostWithAuthor { post, author })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(page_of(rows, page, per_page))
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<PostWithAuthor>, RepoError> {
        let needle = term.map(str::to_lowercase);
        self.0
            .posts_newest_first()
            .into_iter()
            .filter(|post| match &needle {
                Some(needle) => {
                    post.title.to_lowercase().contains(needle)
                        || post.content.to_lowercase().contains(needle)
                }
                None => true,
            })
            .map(|post| {
                let author = self.0.author(post.author_id)?;
                Ok(PostWithAuthor { post, author })
            })
            .collect()
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .0
            .posts_newest_first()
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn insert_with_categories(
        &self,
        post: Post,
        category_ids: &[Uuid],
    ) -> Result<Post, RepoError> {
        let saved = self.insert(post).await?;
        let mut links = self.0.links.lock().unwrap();
        for category_id in category_ids {
            links.push((saved.id, *category_id));
        }
        Ok(saved)
    }

    async fn update_with_categories(
        &self,
        post: Post,
        category_ids: &[Uuid],
    ) -> Result<Post, RepoError> {
        let saved = self.update(post).await?;
        let mut links = self.0.links.lock().unwrap();
        links.retain(|(p, _)| *p != saved.id);
        for category_id in category_ids {
            links.push((saved.id, *category_id));
        }
        Ok(saved)
    }

    async fn categories_of(&self, post_id: Uuid) -> Result<Vec<Category>, RepoError> {
        let links = self.0.links.lock().unwrap().clone();
        let mut categories: Vec<Category> = self
            .0
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| links.contains(&(post_id, c.id)))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for MemoryCategories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self
            .0
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert(&self, entity: Category) -> Result<Category, RepoError> {
        let mut categories = self.0.categories.lock().unwrap();
        if categories.iter().any(|c| c.slug == entity.slug) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        categories.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Category) -> Result<Category, RepoError> {
        let mut categories = self.0.categories.lock().unwrap();
        let slot = categories
            .iter_mut()
            .find(|c| c.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut categories = self.0.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(RepoError::NotFound);
        }
        self.0.links.lock().unwrap().retain(|(_, c)| *c != id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategories {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        Ok(self
            .0
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let mut categories = self.0.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(categories)
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Category>, RepoError> {
        Ok(self
            .0
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| slugs.contains(&c.slug))
            .cloned()
            .collect())
    }

    async fn counts(&self) -> Result<Vec<CategoryCount>, RepoError> {
        let links = self.0.links.lock().unwrap().clone();
        let mut categories = self.0.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| a.slug.cmp(&b.slug));

        Ok(categories
            .into_iter()
            .filter_map(|category| {
                let post_count = links.iter().filter(|(_, c)| *c == category.id).count() as i64;
                (post_count > 0).then_some(CategoryCount {
                    slug: category.slug,
                    title: category.title,
                    post_count,
                })
            })
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for MemoryComments {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self
            .0
            .comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert(&self, entity: Comment) -> Result<Comment, RepoError> {
        self.0.comments.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut comments = self.0.comments.lock().unwrap();
        let slot = comments
            .iter_mut()
            .find(|c| c.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut comments = self.0.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.id != id);
        if comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryComments {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let mut comments: Vec<Comment> = self
            .0
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        comments
            .into_iter()
            .map(|comment| {
                let author = self.0.author(comment.user_id)?;
                Ok(CommentWithAuthor { comment, author })
            })
            .collect()
    }
}

/// Everything a handler test needs: state over the memory doubles plus
/// real token and password services.
pub struct Backend {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

impl Backend {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let state = AppState {
            users: Arc::new(MemoryUsers(store.clone())),
            profiles: Arc::new(MemoryProfiles(store.clone())),
            posts: Arc::new(MemoryPosts(store.clone())),
            categories: Arc::new(MemoryCategories(store.clone())),
            comments: Arc::new(MemoryComments(store.clone())),
        };
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "test".to_string(),
        }));
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        Self {
            state,
            store,
            tokens,
            passwords,
        }
    }

    /// Seed an account (with profile) and mint a token for it.
    pub fn seed_user(&self, username: &str, password: &str, grants: &[&str]) -> (User, String) {
        let hash = self.passwords.hash(password).unwrap();
        let mut user = User::new(username.to_string(), format!("{username}@example.com"), hash);
        user.permissions = grants.iter().map(|g| g.to_string()).collect();

        self.store.users.lock().unwrap().push(user.clone());
        self.store
            .profiles
            .lock()
            .unwrap()
            .push(Profile::new(user.id));

        let token = self
            .tokens
            .generate_token(user.id, &user.username, user.permissions.clone())
            .unwrap();
        (user, token)
    }

    pub fn seed_post(&self, author: &User, title: &str, content: &str) -> Post {
        let post = Post::new(
            author.id,
            title.to_string(),
            slug::slugify(title),
            content.to_string(),
        );
        self.store.posts.lock().unwrap().push(post.clone());
        post
    }

    /// Seed a post with an explicit creation time, for ordering-sensitive
    /// assertions.
    pub fn seed_post_at(
        &self,
        author: &User,
        title: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Post {
        let mut post = self.seed_post(author, title, content);
        {
            let mut posts = self.store.posts.lock().unwrap();
            let slot = posts.iter_mut().find(|p| p.id == post.id).unwrap();
            slot.created_at = created_at;
            post = slot.clone();
        }
        post
    }

    pub fn seed_category(&self, author: &User, title: &str) -> Category {
        let category = Category::new(author.id, title.to_string(), slug::slugify(title));
        self.store
            .categories
            .lock()
            .unwrap()
            .push(category.clone());
        category
    }

    pub fn link(&self, post: &Post, category: &Category) {
        self.store
            .links
            .lock()
            .unwrap()
            .push((post.id, category.id));
    }
}

/// Build an initialized test service over a [`Backend`].
macro_rules! test_app {
    ($backend:expr) => {{
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($backend.state.clone()))
                .app_data(actix_web::web::Data::new($backend.tokens.clone()))
                .app_data(actix_web::web::Data::new($backend.passwords.clone()))
                .configure(crate::handlers::configure_routes),
        )
        .await
    }};
}

pub(crate) use test_app;
