//! SeaORM entities mirroring the domain model.

pub mod category;
pub mod comment;
pub mod post;
pub mod post_category;
pub mod profile;
pub mod user;
