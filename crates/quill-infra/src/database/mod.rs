//! Database connection management and PostgreSQL adapters.

mod connections;
mod postgres_base;
pub mod postgres_repo;

pub mod entity;

pub use connections::DatabaseConfig;
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresProfileRepository, PostgresUserRepository,
};
