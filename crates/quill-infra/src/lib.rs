//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! the PostgreSQL content store (SeaORM) and the token/password services.

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, JwtTokenService};
pub use database::{
    DatabaseConfig, PostgresCategoryRepository, PostgresCommentRepository,
    PostgresPostRepository, PostgresProfileRepository, PostgresUserRepository,
};
