use chrono::Utc;
use common::database::Ulid;

use crate::access::{self, Actor};
use crate::database::Post;
use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::store::Store;

pub struct NewPost {
    pub content: String,
    pub reply_to: Option<Ulid>,
}

pub async fn create_post(
    store: &dyn Store,
    events: &EventBus,
    actor: &Actor,
    page_id: Ulid,
    new: NewPost,
) -> Result<Post> {
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    access::can_create_post(actor, &page).require()?;

    Post::validate_content(&new.content).map_err(Error::invalid)?;

    if let Some(reply_to) = new.reply_to {
        store
            .post_by_id(reply_to)
            .await?
            .ok_or(Error::NotFound("post"))?;
    }

    let now = Utc::now();
    let post = Post {
        id: Ulid::new(),
        page_id: page.id,
        content: new.content,
        reply_to: new.reply_to,
        created_at: now,
        updated_at: now,
    };

    store.create_post(&post).await?;

    events
        .emit(Event::PostCreated {
            post: post.clone(),
            page,
        })
        .await;

    Ok(post)
}

pub async fn update_post(
    store: &dyn Store,
    actor: &Actor,
    post_id: Ulid,
    content: String,
) -> Result<Post> {
    let mut post = store
        .post_by_id(post_id)
        .await?
        .ok_or(Error::NotFound("post"))?;
    let page = store
        .page_by_id(post.page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    access::can_write_post(actor, &page).require()?;

    Post::validate_content(&content).map_err(Error::invalid)?;

    post.content = content;
    post.updated_at = Utc::now();

    store.update_post(&post).await?;

    Ok(post)
}

pub async fn delete_post(store: &dyn Store, actor: &Actor, post_id: Ulid) -> Result<()> {
    let post = store
        .post_by_id(post_id)
        .await?
        .ok_or(Error::NotFound("post"))?;
    let page = store
        .page_by_id(post.page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    access::can_delete_post(actor, &page).require()?;

    store.delete_post(post.id).await?;

    Ok(())
}

pub async fn like(
    store: &dyn Store,
    events: &EventBus,
    actor: &Actor,
    post_id: Ulid,
) -> Result<()> {
    let post = store
        .post_by_id(post_id)
        .await?
        .ok_or(Error::NotFound("post"))?;
    let page = store
        .page_by_id(post.page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    access::can_like_post(actor, &page).require()?;
    let Some(user) = actor.user() else {
        return Err(Error::Forbidden("Authentication required"));
    };

    if store.add_like(post.id, user.id).await? {
        events.emit(Event::LikesChanged { page }).await;
    }

    Ok(())
}

pub async fn unlike(
    store: &dyn Store,
    events: &EventBus,
    actor: &Actor,
    post_id: Ulid,
) -> Result<()> {
    let post = store
        .post_by_id(post_id)
        .await?
        .ok_or(Error::NotFound("post"))?;
    let page = store
        .page_by_id(post.page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    let Some(user) = actor.user() else {
        return Err(Error::Forbidden("Authentication required"));
    };

    if !store.has_liked(post.id, user.id).await? {
        return Err(Error::Forbidden("You cannot unlike someone else's post"));
    }

    if store.remove_like(post.id, user.id).await? {
        events.emit(Event::LikesChanged { page }).await;
    }

    Ok(())
}

/// Posts from pages the user follows plus their own pages, newest first.
pub async fn news_feed(store: &dyn Store, actor: &Actor) -> Result<Vec<Post>> {
    let Some(user) = actor.user() else {
        return Err(Error::Forbidden("Authentication required"));
    };

    Ok(store.feed_for(user.id).await?)
}

pub async fn liked_posts(store: &dyn Store, actor: &Actor) -> Result<Vec<Post>> {
    let Some(user) = actor.user() else {
        return Err(Error::Forbidden("Authentication required"));
    };

    Ok(store.liked_posts_by(user.id).await?)
}
