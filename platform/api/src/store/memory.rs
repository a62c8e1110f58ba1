use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::database::Ulid;
use tokio::sync::RwLock;

use super::{Result, Store, StoreError};
use crate::database::{Page, Post, Tag, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Ulid, User>,
    pages: HashMap<Ulid, Page>,
    posts: HashMap<Ulid, Post>,
    tags: HashMap<Ulid, Tag>,
    page_tags: HashSet<(Ulid, Ulid)>,
    followers: HashSet<(Ulid, Ulid)>,
    follow_requests: HashSet<(Ulid, Ulid)>,
    likes: HashSet<(Ulid, Ulid)>,
}

impl Tables {
    fn drop_post(&mut self, id: Ulid) {
        self.posts.remove(&id);
        self.likes.retain(|(post_id, _)| *post_id != id);
        for post in self.posts.values_mut() {
            if post.reply_to == Some(id) {
                post.reply_to = None;
            }
        }
    }

    fn drop_page(&mut self, id: Ulid) {
        self.pages.remove(&id);
        self.page_tags.retain(|(page_id, _)| *page_id != id);
        self.followers.retain(|(page_id, _)| *page_id != id);
        self.follow_requests.retain(|(page_id, _)| *page_id != id);

        let posts = self
            .posts
            .values()
            .filter(|p| p.page_id == id)
            .map(|p| p.id)
            .collect::<Vec<_>>();
        for post in posts {
            self.drop_post(post);
        }
    }
}

fn newest_first(posts: &mut Vec<Post>) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `Store` over in-process maps, mirroring the relational layout and the
/// delete cascades of the Postgres schema. Backs the test suite and is
/// useful for embedding.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict("user"));
        }

        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Ulid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email))
        {
            return Err(StoreError::Conflict("user"));
        }

        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned = tables
            .pages
            .values()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect::<Vec<_>>();
        for page in owned {
            tables.drop_page(page);
        }

        tables.followers.retain(|(_, user_id)| *user_id != id);
        tables.follow_requests.retain(|(_, user_id)| *user_id != id);
        tables.likes.retain(|(_, user_id)| *user_id != id);

        Ok(true)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users = tables
            .users
            .values()
            .filter(|u| matches(&u.username, query))
            .cloned()
            .collect::<Vec<_>>();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create_page(&self, page: &Page) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.pages.values().any(|p| p.uuid == page.uuid) {
            return Err(StoreError::Conflict("page"));
        }

        tables.pages.insert(page.id, page.clone());
        Ok(())
    }

    async fn page_by_id(&self, id: Ulid) -> Result<Option<Page>> {
        Ok(self.tables.read().await.pages.get(&id).cloned())
    }

    async fn pages_by_owner(&self, owner_id: Ulid) -> Result<Vec<Page>> {
        let tables = self.tables.read().await;
        let mut pages = tables
            .pages
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect::<Vec<_>>();
        pages.sort_by_key(|p| p.id);
        Ok(pages)
    }

    async fn update_page(&self, page: &Page) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.pages.insert(page.id, page.clone());
        Ok(())
    }

    async fn delete_page(&self, id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if !tables.pages.contains_key(&id) {
            return Ok(false);
        }

        tables.drop_page(id);
        Ok(true)
    }

    async fn search_pages(&self, query: &str) -> Result<Vec<Page>> {
        let tables = self.tables.read().await;
        let mut pages = tables
            .pages
            .values()
            .filter(|p| {
                matches(&p.name, query)
                    || matches(&p.uuid.to_string(), query)
                    || tables.page_tags.iter().any(|(page_id, tag_id)| {
                        *page_id == p.id
                            && tables
                                .tags
                                .get(tag_id)
                                .is_some_and(|t| matches(&t.name, query))
                    })
            })
            .cloned()
            .collect::<Vec<_>>();
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pages)
    }

    async fn pages_due_unblock(&self, now: DateTime<Utc>) -> Result<Vec<Page>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pages
            .values()
            .filter(|p| p.is_blocked && p.unblock_date.is_some_and(|date| date <= now))
            .cloned()
            .collect())
    }

    async fn unblock_page(&self, id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        let Some(page) = tables.pages.get_mut(&id) else {
            return Ok(false);
        };

        if !page.is_blocked {
            return Ok(false);
        }

        page.is_blocked = false;
        page.unblock_date = None;
        Ok(true)
    }

    async fn add_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.followers.insert((page_id, user_id)))
    }

    async fn remove_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.followers.remove(&(page_id, user_id)))
    }

    async fn is_follower(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .await
            .followers
            .contains(&(page_id, user_id)))
    }

    async fn followers_of(&self, page_id: Ulid) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users = tables
            .followers
            .iter()
            .filter(|(p, _)| *p == page_id)
            .filter_map(|(_, u)| tables.users.get(u).cloned())
            .collect::<Vec<_>>();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn follower_count(&self, page_id: Ulid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.followers.iter().filter(|(p, _)| *p == page_id).count() as i64)
    }

    async fn add_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.follow_requests.insert((page_id, user_id)))
    }

    async fn remove_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.follow_requests.remove(&(page_id, user_id)))
    }

    async fn has_follow_request(&self, page_id: Ulid, user_id: Ulid) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .await
            .follow_requests
            .contains(&(page_id, user_id)))
    }

    async fn follow_requests_of(&self, page_id: Ulid) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users = tables
            .follow_requests
            .iter()
            .filter(|(p, _)| *p == page_id)
            .filter_map(|(_, u)| tables.users.get(u).cloned())
            .collect::<Vec<_>>();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn upsert_tag(&self, name: &str) -> Result<Tag> {
        let mut tables = self.tables.write().await;

        if let Some(tag) = tables.tags.values().find(|t| t.name == name) {
            return Ok(tag.clone());
        }

        let tag = Tag {
            id: Ulid::new(),
            name: name.to_string(),
        };
        tables.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tables = self.tables.read().await;
        Ok(tables.tags.values().find(|t| t.name == name).cloned())
    }

    async fn attach_tag(&self, page_id: Ulid, tag_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.page_tags.insert((page_id, tag_id)))
    }

    async fn detach_tag(&self, page_id: Ulid, tag_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.page_tags.remove(&(page_id, tag_id)))
    }

    async fn tags_of(&self, page_id: Ulid) -> Result<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut tags = tables
            .page_tags
            .iter()
            .filter(|(p, _)| *p == page_id)
            .filter_map(|(_, t)| tables.tags.get(t).cloned())
            .collect::<Vec<_>>();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn post_by_id(&self, id: Ulid) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn delete_post(&self, id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&id) {
            return Ok(false);
        }

        tables.drop_post(id);
        Ok(true)
    }

    async fn posts_by_page(&self, page_id: Ulid) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut posts = tables
            .posts
            .values()
            .filter(|p| p.page_id == page_id)
            .cloned()
            .collect::<Vec<_>>();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn post_count(&self, page_id: Ulid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| p.page_id == page_id).count() as i64)
    }

    async fn add_like(&self, post_id: Ulid, user_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.likes.insert((post_id, user_id)))
    }

    async fn remove_like(&self, post_id: Ulid, user_id: Ulid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.likes.remove(&(post_id, user_id)))
    }

    async fn has_liked(&self, post_id: Ulid, user_id: Ulid) -> Result<bool> {
        Ok(self.tables.read().await.likes.contains(&(post_id, user_id)))
    }

    async fn like_count_for_page(&self, page_id: Ulid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|(post_id, _)| {
                tables
                    .posts
                    .get(post_id)
                    .is_some_and(|p| p.page_id == page_id)
            })
            .count() as i64)
    }

    async fn liked_posts_by(&self, user_id: Ulid) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        let mut posts = tables
            .likes
            .iter()
            .filter(|(_, u)| *u == user_id)
            .filter_map(|(post_id, _)| tables.posts.get(post_id).cloned())
            .collect::<Vec<_>>();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn feed_for(&self, user_id: Ulid) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;

        let pages = tables
            .followers
            .iter()
            .filter(|(_, u)| *u == user_id)
            .map(|(p, _)| *p)
            .chain(
                tables
                    .pages
                    .values()
                    .filter(|p| p.owner_id == user_id)
                    .map(|p| p.id),
            )
            .collect::<HashSet<_>>();

        let mut posts = tables
            .posts
            .values()
            .filter(|p| pages.contains(&p.page_id))
            .cloned()
            .collect::<Vec<_>>();
        newest_first(&mut posts);
        Ok(posts)
    }
}
