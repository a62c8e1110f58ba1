//! Access decisions for every mutation the backend accepts. One predicate
//! family per resource; the first matching rule wins and denial is an
//! ordinary return value, surfaced to the request layer with its reason.

use std::collections::HashSet;

use crate::database::{Page, User};
use crate::error::Error;

/// The authenticated identity behind a request, resolved by the request
/// layer before any core operation runs.
#[derive(Debug, Clone, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    User(User),
}

impl Actor {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    fn is(&self, id: common::database::Ulid) -> bool {
        self.user().is_some_and(|u| u.id == id)
    }

    fn is_authority(&self) -> bool {
        self.user().is_some_and(|u| u.role.is_authority())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }
}

/// Page fields a partial update may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageField {
    Name,
    Description,
    Image,
    IsPrivate,
    IsBlocked,
    UnblockDate,
}

/// User fields a partial update may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Username,
    Email,
    IsBlocked,
}

const PAGE_OWNER_FIELDS: &[PageField] = &[
    PageField::Name,
    PageField::Description,
    PageField::Image,
    PageField::IsPrivate,
];
const PAGE_AUTHORITY_FIELDS: &[PageField] = &[PageField::IsBlocked, PageField::UnblockDate];

const USER_SELF_FIELDS: &[UserField] = &[UserField::Username, UserField::Email];
const USER_AUTHORITY_FIELDS: &[UserField] = &[UserField::IsBlocked];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts a denial into the client-visible forbidden outcome.
    pub fn require(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(Error::Forbidden(reason)),
        }
    }
}

fn deny_anonymous(actor: &Actor) -> Option<Decision> {
    match actor {
        Actor::Anonymous => Some(Decision::Deny("Authentication required")),
        Actor::User(_) => None,
    }
}

pub fn can_read_page(_actor: &Actor, _page: &Page) -> Decision {
    // Pages are publicly listable; private pages gate subscription, not
    // object reads.
    Decision::Allow
}

pub fn can_create_page(actor: &Actor) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    Decision::Allow
}

pub fn can_write_page(
    actor: &Actor,
    page: &Page,
    verb: Verb,
    fields: &HashSet<PageField>,
) -> Decision {
    if verb.is_safe() {
        return Decision::Allow;
    }

    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if !matches!(verb, Verb::Put | Verb::Patch) {
        return Decision::Deny("Pages can only be edited with PUT or PATCH");
    }

    if fields.is_empty() {
        return Decision::Deny("No editable fields in the request");
    }

    let is_owner = actor.is(page.owner_id);

    if !is_owner && !actor.is_authority() {
        return Decision::Deny("Only the page owner may edit this page");
    }

    // All-or-nothing per actor class: the whole field set must fit one
    // allow-list, mixing owner and authority fields is denied.
    if is_owner && fields.iter().all(|f| PAGE_OWNER_FIELDS.contains(f)) {
        return Decision::Allow;
    }

    if actor.is_authority() && fields.iter().all(|f| PAGE_AUTHORITY_FIELDS.contains(f)) {
        return Decision::Allow;
    }

    Decision::Deny("A submitted field is not editable by this actor")
}

pub fn can_delete_page(actor: &Actor, page: &Page) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    // Deliberately stricter than page updates: authorities may block a
    // page but not delete it.
    if !actor.is(page.owner_id) {
        return Decision::Deny("Only the page owner may delete this page");
    }

    Decision::Allow
}

pub fn can_read_user(_actor: &Actor, _user: &User) -> Decision {
    Decision::Allow
}

pub fn can_write_user(
    actor: &Actor,
    target: &User,
    verb: Verb,
    fields: &HashSet<UserField>,
) -> Decision {
    if verb.is_safe() {
        return Decision::Allow;
    }

    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if !matches!(verb, Verb::Put | Verb::Patch) {
        return Decision::Deny("Users can only be edited with PUT or PATCH");
    }

    if fields.is_empty() {
        return Decision::Deny("No editable fields in the request");
    }

    let is_self = actor.is(target.id);

    if !is_self && !actor.is_authority() {
        return Decision::Deny("Only the user themself may edit this account");
    }

    if is_self && fields.iter().all(|f| USER_SELF_FIELDS.contains(f)) {
        return Decision::Allow;
    }

    if actor.is_authority() && fields.iter().all(|f| USER_AUTHORITY_FIELDS.contains(f)) {
        return Decision::Allow;
    }

    Decision::Deny("A submitted field is not editable by this actor")
}

pub fn can_delete_user(actor: &Actor, _target: &User) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if !actor.is_authority() {
        return Decision::Deny("Only a moderator or admin may delete users");
    }

    Decision::Allow
}

pub fn can_create_post(actor: &Actor, page: &Page) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if !actor.is(page.owner_id) {
        return Decision::Deny("You don't have permission to create posts for this page");
    }

    Decision::Allow
}

pub fn can_write_post(actor: &Actor, page: &Page) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if !actor.is(page.owner_id) {
        return Decision::Deny("You don't have permission to update this post");
    }

    Decision::Allow
}

pub fn can_delete_post(actor: &Actor, page: &Page) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if !actor.is(page.owner_id) && !actor.is_authority() {
        return Decision::Deny("You don't have permission to delete this post");
    }

    Decision::Allow
}

pub fn can_like_post(actor: &Actor, page: &Page) -> Decision {
    if let Some(deny) = deny_anonymous(actor) {
        return deny;
    }

    if actor.is(page.owner_id) {
        return Decision::Deny("You cannot like a post that you own");
    }

    Decision::Allow
}
