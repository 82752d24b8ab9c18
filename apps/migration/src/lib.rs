//! Database schema migrations for the Quill blog backend.

pub use sea_orm_migration::prelude::*;

mod m20250810_000001_create_users;
mod m20250810_000002_create_profiles;
mod m20250810_000003_create_posts;
mod m20250810_000004_create_categories;
mod m20250810_000005_create_post_categories;
mod m20250810_000006_create_comments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250810_000001_create_users::Migration),
            Box::new(m20250810_000002_create_profiles::Migration),
            Box::new(m20250810_000003_create_posts::Migration),
            Box::new(m20250810_000004_create_categories::Migration),
            Box::new(m20250810_000005_create_post_categories::Migration),
            Box::new(m20250810_000006_create_comments::Migration),
        ]
    }
}
