use std::sync::Arc;

use super::{actor, seed_page, seed_user, RecordingNotifier};
use crate::database::Role;
use crate::events::EventBus;
use crate::notifications::{self, FollowerNotifier, NewPostNotice};
use crate::posts::{self, NewPost};
use crate::store::{MemoryStore, Store};
use crate::subscriptions;

fn post(content: &str) -> NewPost {
    NewPost {
        content: content.to_string(),
        reply_to: None,
    }
}

fn setup(notifier: Arc<RecordingNotifier>) -> (Arc<MemoryStore>, EventBus) {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn Store> = store.clone();
    let events = EventBus::new().with_handler(Arc::new(FollowerNotifier::new(dyn_store, notifier)));
    (store, events)
}

#[tokio::test]
async fn test_new_post_notifies_each_follower() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (store, events) = setup(notifier.clone());

    let owner = seed_user(store.as_ref(), "owner", Role::User).await;
    let first = seed_user(store.as_ref(), "first", Role::User).await;
    let second = seed_user(store.as_ref(), "second", Role::User).await;
    let page = seed_page(store.as_ref(), &owner, "page", false).await;

    subscriptions::follow(store.as_ref(), &events, first.id, page.id)
        .await
        .unwrap();
    subscriptions::follow(store.as_ref(), &events, second.id, page.id)
        .await
        .unwrap();

    posts::create_post(store.as_ref(), &events, &actor(&owner), page.id, post("news"))
        .await
        .unwrap();

    let jobs = notifier.jobs.lock().await;
    assert_eq!(jobs.len(), 2);

    let mut emails = jobs.iter().map(|j| j.email.as_str()).collect::<Vec<_>>();
    emails.sort_unstable();
    assert_eq!(emails, vec!["first@example.com", "second@example.com"]);

    assert!(jobs.iter().all(|j| j.body.contains("news")));
    assert!(jobs.iter().all(|j| j.body.contains("owner")));
}

#[tokio::test]
async fn test_failed_dispatch_does_not_stop_the_rest() {
    let notifier = Arc::new(RecordingNotifier {
        fail_for: Some("first@example.com".to_string()),
        ..Default::default()
    });
    let (store, events) = setup(notifier.clone());

    let owner = seed_user(store.as_ref(), "owner", Role::User).await;
    let first = seed_user(store.as_ref(), "first", Role::User).await;
    let second = seed_user(store.as_ref(), "second", Role::User).await;
    let page = seed_page(store.as_ref(), &owner, "page", false).await;

    subscriptions::follow(store.as_ref(), &events, first.id, page.id)
        .await
        .unwrap();
    subscriptions::follow(store.as_ref(), &events, second.id, page.id)
        .await
        .unwrap();

    // The failing recipient must not fail post creation either.
    posts::create_post(store.as_ref(), &events, &actor(&owner), page.id, post("news"))
        .await
        .unwrap();

    let jobs = notifier.jobs.lock().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].email, "second@example.com");
}

#[tokio::test]
async fn test_no_followers_no_jobs() {
    let notifier = Arc::new(RecordingNotifier::default());
    let (store, events) = setup(notifier.clone());

    let owner = seed_user(store.as_ref(), "owner", Role::User).await;
    let page = seed_page(store.as_ref(), &owner, "page", false).await;

    posts::create_post(store.as_ref(), &events, &actor(&owner), page.id, post("quiet"))
        .await
        .unwrap();

    assert!(notifier.jobs.lock().await.is_empty());
}

#[test]
fn test_rendered_notice_mentions_post_details() {
    let notice = NewPostNotice {
        post_id: common::database::Ulid::new(),
        content: "hello world".to_string(),
        page_owner_username: "author".to_string(),
        page_id: common::database::Ulid::new(),
    };

    let subject = notifications::render_subject("reader");
    let body = notifications::render_body(&notice);

    assert_eq!(subject, "Dear reader!");
    assert!(body.contains("author just published a new post!"));
    assert!(body.contains("hello world"));
    assert!(body.contains(&notice.page_id.to_string()));
    assert!(body.contains(&notice.post_id.to_string()));
}
