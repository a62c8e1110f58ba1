use std::collections::HashSet;

use chrono::Utc;
use common::database::Ulid;

use crate::access::{self, Actor, UserField, Verb};
use crate::database::{Role, User};
use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::store::{Store, StoreError};

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub title: String,
}

/// A partial user update.
#[derive(Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_blocked: Option<bool>,
}

impl UserUpdate {
    pub fn fields(&self) -> HashSet<UserField> {
        let mut fields = HashSet::new();
        if self.username.is_some() {
            fields.insert(UserField::Username);
        }
        if self.email.is_some() {
            fields.insert(UserField::Email);
        }
        if self.is_blocked.is_some() {
            fields.insert(UserField::IsBlocked);
        }
        fields
    }
}

pub async fn register(store: &dyn Store, new: NewUser) -> Result<User> {
    User::validate_username(&new.username).map_err(Error::invalid)?;
    User::validate_email(&new.email).map_err(Error::invalid)?;
    User::validate_password(&new.password).map_err(Error::invalid)?;

    let user = User {
        id: Ulid::new(),
        username: new.username,
        email: new.email,
        password_hash: User::hash_password(&new.password),
        role: Role::User,
        title: new.title,
        is_blocked: false,
        created_at: Utc::now(),
    };

    match store.create_user(&user).await {
        Ok(()) => Ok(user),
        Err(StoreError::Conflict(_)) => {
            Err(Error::invalid("Username or email is already taken"))
        }
        Err(err) => Err(err.into()),
    }
}

/// Applies a field-scoped partial update. Saving the user re-runs the
/// block cascade onto their pages through the emitted event.
pub async fn update_user(
    store: &dyn Store,
    events: &EventBus,
    actor: &Actor,
    target_id: Ulid,
    verb: Verb,
    update: UserUpdate,
) -> Result<User> {
    let mut target = store
        .user_by_id(target_id)
        .await?
        .ok_or(Error::NotFound("user"))?;

    access::can_write_user(actor, &target, verb, &update.fields()).require()?;

    if let Some(username) = update.username {
        User::validate_username(&username).map_err(Error::invalid)?;
        target.username = username;
    }
    if let Some(email) = update.email {
        User::validate_email(&email).map_err(Error::invalid)?;
        target.email = email;
    }
    if let Some(is_blocked) = update.is_blocked {
        target.is_blocked = is_blocked;
    }

    match store.update_user(&target).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(Error::invalid("Username or email is already taken"))
        }
        Err(err) => return Err(err.into()),
    }

    events
        .emit(Event::UserSaved {
            user: target.clone(),
        })
        .await;

    Ok(target)
}

pub async fn delete_user(store: &dyn Store, actor: &Actor, target_id: Ulid) -> Result<()> {
    let target = store
        .user_by_id(target_id)
        .await?
        .ok_or(Error::NotFound("user"))?;

    access::can_delete_user(actor, &target).require()?;

    store.delete_user(target.id).await?;

    Ok(())
}

pub async fn search_users(store: &dyn Store, query: &str) -> Result<Vec<User>> {
    Ok(store.search_users(query).await?)
}
