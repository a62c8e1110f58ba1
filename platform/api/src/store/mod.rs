//! Repository-style access to the persistent store. Relation mutations
//! (followers, follow requests, likes, tags) are single atomic statements
//! so concurrent requests against the same page or post cannot lose
//! updates; cross-entity transactions are not assumed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::database::Ulid;

use crate::database::{Page, Post, Tag, User};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} already exists")]
    Conflict(&'static str),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn user_by_id(&self, id: Ulid) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn delete_user(&self, id: Ulid) -> Result<bool>;
    async fn search_users(&self, query: &str) -> Result<Vec<User>>;

    // pages
    async fn create_page(&self, page: &Page) -> Result<()>;
    async fn page_by_id(&self, id: Ulid) -> Result<Option<Page>>;
    async fn pages_by_owner(&self, owner_id: Ulid) -> Result<Vec<Page>>;
    async fn update_page(&self, page: &Page) -> Result<()>;
    async fn delete_page(&self, id: Ulid) -> Result<bool>;
    async fn search_pages(&self, query: &str) -> Result<Vec<Page>>;
    /// Pages whose authority-set block has expired at `now`.
    async fn pages_due_unblock(&self, now: DateTime<Utc>) -> Result<Vec<Page>>;
    /// Clears `is_blocked` and `unblock_date` in one update. Returns false
    /// when the page was already unblocked (e.g. a concurrent manual update).
    async fn unblock_page(&self, id: Ulid) -> Result<bool>;

    // follower relations; adds return false when the row already existed,
    // removes return false when there was nothing to remove
    async fn add_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn remove_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn is_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn followers_of(&self, page_id: Ulid) -> Result<Vec<User>>;
    async fn follower_count(&self, page_id: Ulid) -> Result<i64>;

    async fn add_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn remove_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn has_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn follow_requests_of(&self, page_id: Ulid) -> Result<Vec<User>>;

    // tags
    /// Returns the tag with the given name, creating it if necessary.
    async fn upsert_tag(&self, name: &str) -> Result<Tag>;
    async fn tag_by_name(&self, name: &str) -> Result<Option<Tag>>;
    async fn attach_tag(&self, page_id: Ulid, tag_id: Ulid) -> Result<bool>;
    async fn detach_tag(&self, page_id: Ulid, tag_id: Ulid) -> Result<bool>;
    async fn tags_of(&self, page_id: Ulid) -> Result<Vec<Tag>>;

    // posts
    async fn create_post(&self, post: &Post) -> Result<()>;
    async fn post_by_id(&self, id: Ulid) -> Result<Option<Post>>;
    async fn update_post(&self, post: &Post) -> Result<()>;
    /// Deletes a post, clearing `reply_to` on its replies.
    async fn delete_post(&self, id: Ulid) -> Result<bool>;
    async fn posts_by_page(&self, page_id: Ulid) -> Result<Vec<Post>>;
    async fn post_count(&self, page_id: Ulid) -> Result<i64>;

    // likes
    async fn add_like(&self, post_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn remove_like(&self, post_id: Ulid, user_id: Ulid) -> Result<bool>;
    async fn has_liked(&self, post_id: Ulid, user_id: Ulid) -> Result<bool>;
    /// Total likes across every post of the page.
    async fn like_count_for_page(&self, page_id: Ulid) -> Result<i64>;
    async fn liked_posts_by(&self, user_id: Ulid) -> Result<Vec<Post>>;

    /// Posts from pages the user follows plus the user's own pages,
    /// newest first.
    async fn feed_for(&self, user_id: Ulid) -> Result<Vec<Post>>;
}
