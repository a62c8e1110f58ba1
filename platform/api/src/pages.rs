use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::database::Ulid;

use crate::access::{self, Actor, PageField, Verb};
use crate::database::{Page, Tag, User};
use crate::error::{Error, Result};
use crate::events::{Event, EventBus, EventHandler};
use crate::store::Store;

pub struct NewPage {
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub tags: Vec<String>,
    pub image_path: Option<String>,
}

/// A partial page update. `unblock_date` distinguishes "leave as is"
/// (outer `None`) from "clear" (inner `None`).
#[derive(Default)]
pub struct PageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<Option<String>>,
    pub is_private: Option<bool>,
    pub is_blocked: Option<bool>,
    pub unblock_date: Option<Option<DateTime<Utc>>>,
}

impl PageUpdate {
    pub fn fields(&self) -> HashSet<PageField> {
        let mut fields = HashSet::new();
        if self.name.is_some() {
            fields.insert(PageField::Name);
        }
        if self.description.is_some() {
            fields.insert(PageField::Description);
        }
        if self.image_path.is_some() {
            fields.insert(PageField::Image);
        }
        if self.is_private.is_some() {
            fields.insert(PageField::IsPrivate);
        }
        if self.is_blocked.is_some() {
            fields.insert(PageField::IsBlocked);
        }
        if self.unblock_date.is_some() {
            fields.insert(PageField::UnblockDate);
        }
        fields
    }
}

pub async fn create_page(
    store: &dyn Store,
    events: &EventBus,
    actor: &Actor,
    new: NewPage,
) -> Result<Page> {
    access::can_create_page(actor).require()?;
    let Some(owner) = actor.user() else {
        return Err(Error::Forbidden("Authentication required"));
    };

    Page::validate_name(&new.name).map_err(Error::invalid)?;

    let page = Page {
        id: Ulid::new(),
        uuid: uuid::Uuid::new_v4(),
        name: new.name,
        description: new.description,
        owner_id: owner.id,
        image_path: new.image_path,
        is_private: new.is_private,
        is_blocked: false,
        unblock_date: None,
    };

    store.create_page(&page).await?;

    for name in &new.tags {
        Tag::validate_name(name).map_err(Error::invalid)?;
        let tag = store.upsert_tag(name).await?;
        store.attach_tag(page.id, tag.id).await?;
    }

    events
        .emit(Event::PageCreated { page: page.clone() })
        .await;

    Ok(page)
}

pub async fn update_page(
    store: &dyn Store,
    actor: &Actor,
    page_id: Ulid,
    verb: Verb,
    update: PageUpdate,
) -> Result<Page> {
    let mut page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    access::can_write_page(actor, &page, verb, &update.fields()).require()?;

    if let Some(name) = update.name {
        Page::validate_name(&name).map_err(Error::invalid)?;
        page.name = name;
    }
    if let Some(description) = update.description {
        page.description = description;
    }
    if let Some(image_path) = update.image_path {
        page.image_path = image_path;
    }
    if let Some(is_private) = update.is_private {
        // A privacy flip does not purge pending follow requests.
        page.is_private = is_private;
    }
    if let Some(is_blocked) = update.is_blocked {
        page.is_blocked = is_blocked;
    }
    if let Some(unblock_date) = update.unblock_date {
        page.unblock_date = unblock_date;
    }

    store.update_page(&page).await?;

    Ok(page)
}

pub async fn delete_page(store: &dyn Store, actor: &Actor, page_id: Ulid) -> Result<()> {
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    access::can_delete_page(actor, &page).require()?;

    store.delete_page(page.id).await?;

    Ok(())
}

/// Attaches tags by name, creating missing ones through the store's
/// atomic upsert. Owner-only, authorities included.
pub async fn add_tags(
    store: &dyn Store,
    actor: &Actor,
    page_id: Ulid,
    names: &[String],
) -> Result<Vec<Tag>> {
    let page = owned_page(store, actor, page_id).await?;

    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        Tag::validate_name(name).map_err(Error::invalid)?;
        let tag = store.upsert_tag(name).await?;
        store.attach_tag(page.id, tag.id).await?;
        tags.push(tag);
    }

    Ok(tags)
}

/// Detaches tags by name. Unknown names are skipped.
pub async fn remove_tags(
    store: &dyn Store,
    actor: &Actor,
    page_id: Ulid,
    names: &[String],
) -> Result<()> {
    let page = owned_page(store, actor, page_id).await?;

    for name in names {
        if let Some(tag) = store.tag_by_name(name).await? {
            store.detach_tag(page.id, tag.id).await?;
        }
    }

    Ok(())
}

pub async fn followers(store: &dyn Store, actor: &Actor, page_id: Ulid) -> Result<Vec<User>> {
    if actor.user().is_none() {
        return Err(Error::Forbidden("Authentication required"));
    }

    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    Ok(store.followers_of(page.id).await?)
}

/// The pending follow requests of a page. Owner-only.
pub async fn follow_requests(
    store: &dyn Store,
    actor: &Actor,
    page_id: Ulid,
) -> Result<Vec<User>> {
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    if !actor.user().is_some_and(|u| u.id == page.owner_id) {
        return Err(Error::Forbidden("Access has been denied"));
    }

    Ok(store.follow_requests_of(page.id).await?)
}

pub async fn search_pages(store: &dyn Store, query: &str) -> Result<Vec<Page>> {
    Ok(store.search_pages(query).await?)
}

async fn owned_page(store: &dyn Store, actor: &Actor, page_id: Ulid) -> Result<Page> {
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    if !actor.user().is_some_and(|u| u.id == page.owner_id) {
        return Err(Error::Forbidden(
            "You do not have permission to perform this action",
        ));
    }

    Ok(page)
}

/// Mirrors a user's blocked state onto every page they own. An
/// owner-driven block carries no expiry, so any authority-set
/// `unblock_date` is overwritten in both directions.
pub struct PageBlockCascade {
    store: Arc<dyn Store>,
}

impl PageBlockCascade {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler for PageBlockCascade {
    fn name(&self) -> &'static str {
        "page-block-cascade"
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        let Event::UserSaved { user } = event else {
            return Ok(());
        };

        for mut page in self.store.pages_by_owner(user.id).await? {
            if page.is_blocked == user.is_blocked && page.unblock_date.is_none() {
                continue;
            }

            page.is_blocked = user.is_blocked;
            page.unblock_date = None;

            if let Err(err) = self.store.update_page(&page).await {
                tracing::error!(page = %page.id, error = %err, "failed to cascade block state");
            }
        }

        Ok(())
    }
}
