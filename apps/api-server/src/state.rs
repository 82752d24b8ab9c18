//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{
    CategoryRepository, CommentRepository, PostRepository, ProfileRepository, UserRepository,
};
use quill_infra::database::{
    DatabaseConfig, PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresProfileRepository, PostgresUserRepository,
};

/// Shared application state: one repository handle per aggregate, all
/// backed by the same connection pool.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl AppState {
    /// Connect to the database and wire up the repositories.
    pub async fn new(config: &DatabaseConfig) -> std::io::Result<Self> {
        let conn = config.connect().await.map_err(std::io::Error::other)?;

        let state = Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            profiles: Arc::new(PostgresProfileRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(conn.clone())),
            comments: Arc::new(PostgresCommentRepository::new(conn)),
        };

        tracing::info!("Application state initialized");

        Ok(state)
    }
}
