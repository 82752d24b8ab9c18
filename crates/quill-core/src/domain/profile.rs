use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Avatar assigned to every freshly registered account.
pub const DEFAULT_AVATAR: &str = "default.jpg";

/// Profile entity - one-to-one extension of a [`super::User`].
///
/// Keyed by the owning user's id; created together with the user and
/// lifecycle-bound to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub avatar: String,
    pub bio: String,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Default profile for a newly registered user.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            avatar: DEFAULT_AVATAR.to_string(),
            bio: String::new(),
            updated_at: Utc::now(),
        }
    }
}
