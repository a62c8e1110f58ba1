use chrono::{DateTime, Utc};
use common::database::Ulid;

/// The maximum length of a post, in bytes.
pub const MAX_POST_CONTENT: usize = 180;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Post {
    /// The unique identifier for the post.
    pub id: Ulid,
    /// The page the post belongs to.
    pub page_id: Ulid,
    /// The content of the post.
    pub content: String,
    /// The post this post replies to, if any. A weak reference: deleting
    /// the target clears it on the replies rather than deleting them.
    pub reply_to: Option<Ulid>,
    /// The time the post was created.
    pub created_at: DateTime<Utc>,
    /// The time the post was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Validates post content.
    pub fn validate_content(content: &str) -> Result<(), &'static str> {
        if content.is_empty() {
            return Err("Post content must not be empty");
        }

        if content.len() > MAX_POST_CONTENT {
            return Err("Post content must be at most 180 characters long");
        }

        Ok(())
    }
}
