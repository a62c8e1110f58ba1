use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::database::Ulid;

use super::{Result, Store, StoreError};
use crate::database::{Page, Post, Tag, User};

/// `Store` backed by Postgres. Every relation mutation is a single
/// statement, so row-level atomicity is provided by the database.
pub struct PgStore {
    db: Arc<sqlx::PgPool>,
}

impl PgStore {
    pub fn new(db: Arc<sqlx::PgPool>) -> Self {
        Self { db }
    }
}

fn conflict_on_unique(err: sqlx::Error, entity: &'static str) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(entity),
        err => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, title, is_blocked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.title)
        .bind(user.is_blocked)
        .bind(user.created_at)
        .execute(self.db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "user"))?;

        Ok(())
    }

    async fn user_by_id(&self, id: Ulid) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET username = $1, email = $2, password_hash = $3, role = $4, title = $5, is_blocked = $6
            WHERE id = $7",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.title)
        .bind(user.is_blocked)
        .bind(user.id)
        .execute(self.db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "user"))?;

        Ok(())
    }

    async fn delete_user(&self, id: Ulid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as(
            "SELECT * FROM users WHERE username ILIKE '%' || $1 || '%' ORDER BY username",
        )
        .bind(query)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(users)
    }

    async fn create_page(&self, page: &Page) -> Result<()> {
        sqlx::query(
            "INSERT INTO pages (id, uuid, name, description, owner_id, image_path, is_private, is_blocked, unblock_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(page.id)
        .bind(page.uuid)
        .bind(&page.name)
        .bind(&page.description)
        .bind(page.owner_id)
        .bind(&page.image_path)
        .bind(page.is_private)
        .bind(page.is_blocked)
        .bind(page.unblock_date)
        .execute(self.db.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "page"))?;

        Ok(())
    }

    async fn page_by_id(&self, id: Ulid) -> Result<Option<Page>> {
        let page = sqlx::query_as("SELECT * FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(page)
    }

    async fn pages_by_owner(&self, owner_id: Ulid) -> Result<Vec<Page>> {
        let pages = sqlx::query_as("SELECT * FROM pages WHERE owner_id = $1 ORDER BY id")
            .bind(owner_id)
            .fetch_all(self.db.as_ref())
            .await?;

        Ok(pages)
    }

    async fn update_page(&self, page: &Page) -> Result<()> {
        sqlx::query(
            "UPDATE pages SET name = $1, description = $2, image_path = $3, is_private = $4, is_blocked = $5, unblock_date = $6
            WHERE id = $7",
        )
        .bind(&page.name)
        .bind(&page.description)
        .bind(&page.image_path)
        .bind(page.is_private)
        .bind(page.is_blocked)
        .bind(page.unblock_date)
        .bind(page.id)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    async fn delete_page(&self, id: Ulid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn search_pages(&self, query: &str) -> Result<Vec<Page>> {
        let pages = sqlx::query_as(
            "SELECT * FROM pages
            WHERE name ILIKE '%' || $1 || '%'
                OR uuid::text ILIKE '%' || $1 || '%'
                OR EXISTS (
                    SELECT 1 FROM page_tags pt
                    JOIN tags t ON t.id = pt.tag_id
                    WHERE pt.page_id = pages.id AND t.name ILIKE '%' || $1 || '%'
                )
            ORDER BY name",
        )
        .bind(query)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(pages)
    }

    async fn pages_due_unblock(&self, now: DateTime<Utc>) -> Result<Vec<Page>> {
        let pages = sqlx::query_as(
            "SELECT * FROM pages WHERE is_blocked AND unblock_date IS NOT NULL AND unblock_date <= $1",
        )
        .bind(now)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(pages)
    }

    async fn unblock_page(&self, id: Ulid) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE pages SET is_blocked = false, unblock_date = NULL WHERE id = $1 AND is_blocked",
        )
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn add_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let res = sqlx::query(
            "INSERT INTO page_followers (page_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(page_id)
        .bind(user_id)
        .execute(self.db.as_ref())
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn remove_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM page_followers WHERE page_id = $1 AND user_id = $2")
            .bind(page_id)
            .bind(user_id)
            .execute(self.db.as_ref())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn is_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM page_followers WHERE page_id = $1 AND user_id = $2)",
        )
        .bind(page_id)
        .bind(user_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(exists)
    }

    async fn followers_of(&self, page_id: Ulid) -> Result<Vec<User>> {
        let users = sqlx::query_as(
            "SELECT u.* FROM users u
            JOIN page_followers f ON f.user_id = u.id
            WHERE f.page_id = $1
            ORDER BY u.username",
        )
        .bind(page_id)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(users)
    }

    async fn follower_count(&self, page_id: Ulid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM page_followers WHERE page_id = $1")
            .bind(page_id)
            .fetch_one(self.db.as_ref())
            .await?;

        Ok(count)
    }

    async fn add_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let res = sqlx::query(
            "INSERT INTO page_follow_requests (page_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(page_id)
        .bind(user_id)
        .execute(self.db.as_ref())
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn remove_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let res =
            sqlx::query("DELETE FROM page_follow_requests WHERE page_id = $1 AND user_id = $2")
                .bind(page_id)
                .bind(user_id)
                .execute(self.db.as_ref())
                .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn has_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM page_follow_requests WHERE page_id = $1 AND user_id = $2)",
        )
        .bind(page_id)
        .bind(user_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(exists)
    }

    async fn follow_requests_of(&self, page_id: Ulid) -> Result<Vec<User>> {
        let users = sqlx::query_as(
            "SELECT u.* FROM users u
            JOIN page_follow_requests r ON r.user_id = u.id
            WHERE r.page_id = $1
            ORDER BY u.username",
        )
        .bind(page_id)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(users)
    }

    async fn upsert_tag(&self, name: &str) -> Result<Tag> {
        // The no-op DO UPDATE makes RETURNING yield the existing row, so
        // concurrent upserts of the same name cannot race check-then-insert.
        let tag = sqlx::query_as(
            "INSERT INTO tags (id, name) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING *",
        )
        .bind(Ulid::new())
        .bind(name)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(tag)
    }

    async fn tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as("SELECT * FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(tag)
    }

    async fn attach_tag(&self, page_id: Ulid, tag_id: Ulid) -> Result<bool> {
        let res = sqlx::query(
            "INSERT INTO page_tags (page_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(page_id)
        .bind(tag_id)
        .execute(self.db.as_ref())
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn detach_tag(&self, page_id: Ulid, tag_id: Ulid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM page_tags WHERE page_id = $1 AND tag_id = $2")
            .bind(page_id)
            .bind(tag_id)
            .execute(self.db.as_ref())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn tags_of(&self, page_id: Ulid) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as(
            "SELECT t.* FROM tags t
            JOIN page_tags pt ON pt.tag_id = t.id
            WHERE pt.page_id = $1
            ORDER BY t.name",
        )
        .bind(page_id)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(tags)
    }

    async fn create_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, page_id, content, reply_to, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(post.id)
        .bind(post.page_id)
        .bind(&post.content)
        .bind(post.reply_to)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    async fn post_by_id(&self, id: Ulid) -> Result<Option<Post>> {
        let post = sqlx::query_as("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        Ok(post)
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        sqlx::query("UPDATE posts SET content = $1, updated_at = $2 WHERE id = $3")
            .bind(&post.content)
            .bind(post.updated_at)
            .bind(post.id)
            .execute(self.db.as_ref())
            .await?;

        Ok(())
    }

    async fn delete_post(&self, id: Ulid) -> Result<bool> {
        // posts.reply_to is ON DELETE SET NULL, which clears the replies.
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn posts_by_page(&self, page_id: Ulid) -> Result<Vec<Post>> {
        let posts =
            sqlx::query_as("SELECT * FROM posts WHERE page_id = $1 ORDER BY created_at DESC")
                .bind(page_id)
                .fetch_all(self.db.as_ref())
                .await?;

        Ok(posts)
    }

    async fn post_count(&self, page_id: Ulid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE page_id = $1")
            .bind(page_id)
            .fetch_one(self.db.as_ref())
            .await?;

        Ok(count)
    }

    async fn add_like(&self, post_id: Ulid, user_id: Ulid) -> Result<bool> {
        let res = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.as_ref())
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn remove_like(&self, post_id: Ulid, user_id: Ulid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.as_ref())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn has_liked(&self, post_id: Ulid, user_id: Ulid) -> Result<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(exists)
    }

    async fn like_count_for_page(&self, page_id: Ulid) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM post_likes l
            JOIN posts p ON p.id = l.post_id
            WHERE p.page_id = $1",
        )
        .bind(page_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(count)
    }

    async fn liked_posts_by(&self, user_id: Ulid) -> Result<Vec<Post>> {
        let posts = sqlx::query_as(
            "SELECT p.* FROM posts p
            JOIN post_likes l ON l.post_id = p.id
            WHERE l.user_id = $1
            ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(posts)
    }

    async fn feed_for(&self, user_id: Ulid) -> Result<Vec<Post>> {
        let posts = sqlx::query_as(
            "SELECT p.* FROM posts p
            WHERE p.page_id IN (
                SELECT page_id FROM page_followers WHERE user_id = $1
                UNION
                SELECT id FROM pages WHERE owner_id = $1
            )
            ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(posts)
    }
}
