use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission grant required to create posts and categories.
///
/// Grants are plain named capabilities on the user account; this one is
/// written by the (external) provisioning tooling, never self-assigned.
pub const CONTENT_AUTHOR_GRANT: &str = "blog.fields";

/// User entity - an account that can author content and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID, no permission grants, and
    /// fresh timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            permissions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account holds a named permission grant.
    pub fn has_permission(&self, grant: &str) -> bool {
        self.permissions.iter().any(|p| p == grant)
    }
}
