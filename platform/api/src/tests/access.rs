use std::collections::HashSet;
use std::hash::Hash;

use super::{make_user, seed_page};
use crate::access::{self, Actor, PageField, UserField, Verb};
use crate::database::{Page, Role};
use crate::store::MemoryStore;

fn set<T: Eq + Hash + Copy>(items: &[T]) -> HashSet<T> {
    items.iter().copied().collect()
}

fn page_owned_by(owner: &crate::database::User) -> Page {
    Page {
        id: common::database::Ulid::new(),
        owner_id: owner.id,
        ..Default::default()
    }
}

#[test]
fn test_safe_verbs_always_allowed() {
    let page = Page::default();
    let user = make_user("reader", Role::User);

    for verb in [Verb::Get, Verb::Head, Verb::Options] {
        assert!(access::can_write_page(&Actor::Anonymous, &page, verb, &set(&[])).is_allowed());
        assert!(
            access::can_write_user(&Actor::Anonymous, &user, verb, &set(&[])).is_allowed()
        );
    }

    assert!(access::can_read_page(&Actor::Anonymous, &page).is_allowed());
    assert!(access::can_read_user(&Actor::Anonymous, &user).is_allowed());
}

#[test]
fn test_anonymous_mutations_denied() {
    let owner = make_user("owner", Role::User);
    let page = page_owned_by(&owner);

    assert!(!access::can_create_page(&Actor::Anonymous).is_allowed());
    assert!(!access::can_write_page(
        &Actor::Anonymous,
        &page,
        Verb::Patch,
        &set(&[PageField::Name])
    )
    .is_allowed());
    assert!(!access::can_delete_page(&Actor::Anonymous, &page).is_allowed());
    assert!(!access::can_create_post(&Actor::Anonymous, &page).is_allowed());
    assert!(!access::can_like_post(&Actor::Anonymous, &page).is_allowed());
}

#[test]
fn test_owner_page_field_scope() {
    let owner = make_user("owner", Role::User);
    let page = page_owned_by(&owner);
    let actor = Actor::User(owner);

    assert!(access::can_write_page(
        &actor,
        &page,
        Verb::Patch,
        &set(&[PageField::Name, PageField::Description, PageField::IsPrivate])
    )
    .is_allowed());

    // Owning the page does not grant the moderation fields.
    assert!(!access::can_write_page(&actor, &page, Verb::Patch, &set(&[PageField::IsBlocked]))
        .is_allowed());

    // Mixing both allow-lists in one request is denied outright.
    assert!(!access::can_write_page(
        &actor,
        &page,
        Verb::Patch,
        &set(&[PageField::Name, PageField::IsBlocked])
    )
    .is_allowed());

    assert!(!access::can_write_page(&actor, &page, Verb::Patch, &set(&[])).is_allowed());
}

#[test]
fn test_authority_page_field_scope() {
    let owner = make_user("owner", Role::User);
    let page = page_owned_by(&owner);

    for role in [Role::Admin, Role::Moderator] {
        let actor = Actor::User(make_user("authority", role));

        assert!(access::can_write_page(
            &actor,
            &page,
            Verb::Patch,
            &set(&[PageField::IsBlocked, PageField::UnblockDate])
        )
        .is_allowed());

        assert!(
            !access::can_write_page(&actor, &page, Verb::Patch, &set(&[PageField::Name]))
                .is_allowed()
        );
    }
}

#[test]
fn test_regular_user_cannot_edit_foreign_page() {
    let owner = make_user("owner", Role::User);
    let page = page_owned_by(&owner);
    let actor = Actor::User(make_user("stranger", Role::User));

    assert!(
        !access::can_write_page(&actor, &page, Verb::Patch, &set(&[PageField::Name]))
            .is_allowed()
    );
}

#[test]
fn test_page_delete_is_owner_only() {
    let owner = make_user("owner", Role::User);
    let page = page_owned_by(&owner);

    assert!(access::can_delete_page(&Actor::User(owner), &page).is_allowed());

    // Authorities may block pages but deliberately may not delete them.
    let admin = Actor::User(make_user("admin", Role::Admin));
    assert!(!access::can_delete_page(&admin, &page).is_allowed());
}

#[test]
fn test_user_field_scope() {
    let target = make_user("target", Role::User);

    let this = Actor::User(target.clone());
    assert!(access::can_write_user(
        &this,
        &target,
        Verb::Patch,
        &set(&[UserField::Username, UserField::Email])
    )
    .is_allowed());
    assert!(
        !access::can_write_user(&this, &target, Verb::Patch, &set(&[UserField::IsBlocked]))
            .is_allowed()
    );

    let admin = Actor::User(make_user("admin", Role::Admin));
    assert!(
        access::can_write_user(&admin, &target, Verb::Patch, &set(&[UserField::IsBlocked]))
            .is_allowed()
    );
    assert!(
        !access::can_write_user(&admin, &target, Verb::Patch, &set(&[UserField::Username]))
            .is_allowed()
    );

    let stranger = Actor::User(make_user("stranger", Role::User));
    assert!(!access::can_write_user(
        &stranger,
        &target,
        Verb::Patch,
        &set(&[UserField::Username])
    )
    .is_allowed());
}

#[test]
fn test_user_delete_requires_authority() {
    let target = make_user("target", Role::User);

    assert!(!access::can_delete_user(&Actor::User(target.clone()), &target).is_allowed());
    assert!(
        access::can_delete_user(&Actor::User(make_user("mod", Role::Moderator)), &target)
            .is_allowed()
    );
}

#[tokio::test]
async fn test_post_predicates() {
    let store = MemoryStore::new();
    let owner = super::seed_user(&store, "owner", Role::User).await;
    let page = seed_page(&store, &owner, "page", false).await;

    let owner_actor = Actor::User(owner);
    let other = Actor::User(make_user("other", Role::User));
    let moderator = Actor::User(make_user("mod", Role::Moderator));

    assert!(access::can_create_post(&owner_actor, &page).is_allowed());
    assert!(!access::can_create_post(&other, &page).is_allowed());

    assert!(access::can_write_post(&owner_actor, &page).is_allowed());
    assert!(!access::can_write_post(&moderator, &page).is_allowed());

    assert!(access::can_delete_post(&owner_actor, &page).is_allowed());
    assert!(access::can_delete_post(&moderator, &page).is_allowed());
    assert!(!access::can_delete_post(&other, &page).is_allowed());

    // The page owner cannot like their own posts.
    assert!(!access::can_like_post(&owner_actor, &page).is_allowed());
    assert!(access::can_like_post(&other, &page).is_allowed());
}
