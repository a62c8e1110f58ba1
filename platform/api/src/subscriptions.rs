//! The follow state machine over (user, page) pairs: `None`, `Requested`
//! (private pages only) and `Following`. Every transition is validated
//! and applied as one atomic relation update.

use common::database::Ulid;

use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    None,
    Requested,
    Following,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Subscribed,
    Requested,
    AlreadySubscribed,
    AlreadyRequested,
}

impl FollowOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Subscribed => "You have subscribed to the page",
            Self::Requested => "Follow request has been sent",
            Self::AlreadySubscribed => "You are already subscribed to the page",
            Self::AlreadyRequested => "Your subscription request has already been sent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Unsubscribed,
    RequestCanceled,
}

impl UnfollowOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unsubscribed => "You have unsubscribed from the page",
            Self::RequestCanceled => "Your follow request has been canceled",
        }
    }
}

/// The current state of a (user, page) pair. Following takes precedence
/// over a lingering request.
pub async fn state_of(store: &dyn Store, page_id: Ulid, user_id: Ulid) -> Result<SubscriptionState> {
    if store.is_follower(page_id, user_id).await? {
        return Ok(SubscriptionState::Following);
    }

    if store.has_follow_request(page_id, user_id).await? {
        return Ok(SubscriptionState::Requested);
    }

    Ok(SubscriptionState::None)
}

/// Subscribes a user to a page, or files a follow request when the page
/// is private. Duplicate calls report their existing state rather than
/// erroring.
pub async fn follow(
    store: &dyn Store,
    events: &EventBus,
    user_id: Ulid,
    page_id: Ulid,
) -> Result<FollowOutcome> {
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(Error::NotFound("user"))?;
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    // Already-following short-circuits a lingering request.
    if store.is_follower(page.id, user.id).await? {
        return Ok(FollowOutcome::AlreadySubscribed);
    }

    if store.has_follow_request(page.id, user.id).await? {
        return Ok(FollowOutcome::AlreadyRequested);
    }

    if page.owner_id == user.id {
        return Err(Error::invalid("You cannot subscribe to yourself"));
    }

    if page.is_private {
        store.add_follow_request(page.id, user.id).await?;
        return Ok(FollowOutcome::Requested);
    }

    if !store.add_follower(page.id, user.id).await? {
        // Lost a race against an identical request.
        return Ok(FollowOutcome::AlreadySubscribed);
    }

    events.emit(Event::FollowersChanged { page }).await;

    Ok(FollowOutcome::Subscribed)
}

/// Unsubscribes a user, or cancels their pending request. Unfollow wins
/// over request-cancel when both relations are present.
pub async fn unfollow(
    store: &dyn Store,
    events: &EventBus,
    user_id: Ulid,
    page_id: Ulid,
) -> Result<UnfollowOutcome> {
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(Error::NotFound("user"))?;
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    if store.remove_follower(page.id, user.id).await? {
        events.emit(Event::FollowersChanged { page }).await;
        return Ok(UnfollowOutcome::Unsubscribed);
    }

    if store.remove_follow_request(page.id, user.id).await? {
        return Ok(UnfollowOutcome::RequestCanceled);
    }

    Err(Error::invalid("You have not subscribed to the page"))
}

/// Accepts pending follow requests, moving each requester into the
/// follower set. Owner-only. Ids without a pending request are skipped.
/// Returns how many requests were accepted.
pub async fn accept(
    store: &dyn Store,
    events: &EventBus,
    actor_id: Ulid,
    page_id: Ulid,
    user_ids: &[Ulid],
) -> Result<usize> {
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    if page.owner_id != actor_id {
        return Err(Error::Forbidden(
            "You are not allowed to perform this action",
        ));
    }

    let mut accepted = 0;
    for &user_id in user_ids {
        if !store.remove_follow_request(page.id, user_id).await? {
            continue;
        }

        store.add_follower(page.id, user_id).await?;
        accepted += 1;
    }

    if accepted > 0 {
        events.emit(Event::FollowersChanged { page }).await;
    }

    Ok(accepted)
}

/// Rejects pending follow requests without adding followers. Owner-only.
/// Returns how many requests were removed.
pub async fn reject(
    store: &dyn Store,
    actor_id: Ulid,
    page_id: Ulid,
    user_ids: &[Ulid],
) -> Result<usize> {
    let page = store
        .page_by_id(page_id)
        .await?
        .ok_or(Error::NotFound("page"))?;

    if page.owner_id != actor_id {
        return Err(Error::Forbidden(
            "You are not allowed to perform this action",
        ));
    }

    let mut rejected = 0;
    for &user_id in user_ids {
        if store.remove_follow_request(page.id, user_id).await? {
            rejected += 1;
        }
    }

    Ok(rejected)
}
