use super::{seed_page, seed_user};
use crate::database::Role;
use crate::error::Error;
use crate::events::EventBus;
use crate::store::{MemoryStore, Store};
use crate::subscriptions::{self, FollowOutcome, SubscriptionState, UnfollowOutcome};

#[tokio::test]
async fn test_follow_public_page() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let follower = seed_user(&store, "follower", Role::User).await;
    let page = seed_page(&store, &owner, "page", false).await;

    let outcome = subscriptions::follow(&store, &events, follower.id, page.id)
        .await
        .unwrap();

    assert_eq!(outcome, FollowOutcome::Subscribed);
    assert_eq!(outcome.message(), "You have subscribed to the page");
    assert!(store.is_follower(page.id, follower.id).await.unwrap());
    assert_eq!(
        subscriptions::state_of(&store, page.id, follower.id)
            .await
            .unwrap(),
        SubscriptionState::Following
    );
}

#[tokio::test]
async fn test_follow_twice_is_idempotent() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let follower = seed_user(&store, "follower", Role::User).await;
    let page = seed_page(&store, &owner, "page", false).await;

    subscriptions::follow(&store, &events, follower.id, page.id)
        .await
        .unwrap();
    let outcome = subscriptions::follow(&store, &events, follower.id, page.id)
        .await
        .unwrap();

    assert_eq!(outcome, FollowOutcome::AlreadySubscribed);
    assert_eq!(store.follower_count(page.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_self_follow_denied() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let page = seed_page(&store, &owner, "page", false).await;

    let err = subscriptions::follow(&store, &events, owner.id, page.id)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Invalid(_)));
    assert_eq!(store.follower_count(page.id).await.unwrap(), 0);
    assert!(!store.has_follow_request(page.id, owner.id).await.unwrap());
}

#[tokio::test]
async fn test_private_page_creates_request() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let requester = seed_user(&store, "requester", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    let outcome = subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    assert_eq!(outcome, FollowOutcome::Requested);
    assert_eq!(outcome.message(), "Follow request has been sent");
    assert!(store.has_follow_request(page.id, requester.id).await.unwrap());
    assert!(!store.is_follower(page.id, requester.id).await.unwrap());

    let again = subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();
    assert_eq!(again, FollowOutcome::AlreadyRequested);
}

#[tokio::test]
async fn test_accept_moves_requester_to_followers() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let requester = seed_user(&store, "requester", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    let accepted = subscriptions::accept(&store, &events, owner.id, page.id, &[requester.id])
        .await
        .unwrap();

    assert_eq!(accepted, 1);
    assert!(store.is_follower(page.id, requester.id).await.unwrap());
    assert!(store.follow_requests_of(page.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reject_never_adds_followers() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let requester = seed_user(&store, "requester", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    let rejected = subscriptions::reject(&store, owner.id, page.id, &[requester.id])
        .await
        .unwrap();

    assert_eq!(rejected, 1);
    assert!(!store.is_follower(page.id, requester.id).await.unwrap());
    assert!(!store.has_follow_request(page.id, requester.id).await.unwrap());
}

#[tokio::test]
async fn test_accept_requires_owner() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let requester = seed_user(&store, "requester", Role::User).await;
    let stranger = seed_user(&store, "stranger", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    let err = subscriptions::accept(&store, &events, stranger.id, page.id, &[requester.id])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Forbidden(_)));
    assert!(store.has_follow_request(page.id, requester.id).await.unwrap());
}

#[tokio::test]
async fn test_accept_skips_ids_without_request() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let requester = seed_user(&store, "requester", Role::User).await;
    let bystander = seed_user(&store, "bystander", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    let accepted =
        subscriptions::accept(&store, &events, owner.id, page.id, &[requester.id, bystander.id])
            .await
            .unwrap();

    assert_eq!(accepted, 1);
    assert!(!store.is_follower(page.id, bystander.id).await.unwrap());
}

#[tokio::test]
async fn test_unfollow() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let follower = seed_user(&store, "follower", Role::User).await;
    let page = seed_page(&store, &owner, "page", false).await;

    subscriptions::follow(&store, &events, follower.id, page.id)
        .await
        .unwrap();

    let outcome = subscriptions::unfollow(&store, &events, follower.id, page.id)
        .await
        .unwrap();

    assert_eq!(outcome, UnfollowOutcome::Unsubscribed);
    assert_eq!(outcome.message(), "You have unsubscribed from the page");
    assert_eq!(store.follower_count(page.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unfollow_cancels_pending_request() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let requester = seed_user(&store, "requester", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    subscriptions::follow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    let outcome = subscriptions::unfollow(&store, &events, requester.id, page.id)
        .await
        .unwrap();

    assert_eq!(outcome, UnfollowOutcome::RequestCanceled);
    assert!(!store.has_follow_request(page.id, requester.id).await.unwrap());
}

#[tokio::test]
async fn test_unfollow_when_not_subscribed_fails() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let stranger = seed_user(&store, "stranger", Role::User).await;
    let page = seed_page(&store, &owner, "page", false).await;

    let err = subscriptions::unfollow(&store, &events, stranger.id, page.id)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Invalid(_)));
}

#[tokio::test]
async fn test_follower_and_request_sets_stay_disjoint() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let owner = seed_user(&store, "owner", Role::User).await;
    let user = seed_user(&store, "user", Role::User).await;
    let page = seed_page(&store, &owner, "page", true).await;

    subscriptions::follow(&store, &events, user.id, page.id)
        .await
        .unwrap();
    subscriptions::accept(&store, &events, owner.id, page.id, &[user.id])
        .await
        .unwrap();

    // Accepted once: in followers, out of requests, and a repeat follow
    // reports the existing subscription instead of re-filing a request.
    assert!(store.is_follower(page.id, user.id).await.unwrap());
    assert!(!store.has_follow_request(page.id, user.id).await.unwrap());

    let outcome = subscriptions::follow(&store, &events, user.id, page.id)
        .await
        .unwrap();
    assert_eq!(outcome, FollowOutcome::AlreadySubscribed);
    assert!(!store.has_follow_request(page.id, user.id).await.unwrap());
}

#[tokio::test]
async fn test_follow_missing_page_not_found() {
    let store = MemoryStore::new();
    let events = EventBus::new();
    let user = seed_user(&store, "user", Role::User).await;

    let err = subscriptions::follow(&store, &events, user.id, common::database::Ulid::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
}
