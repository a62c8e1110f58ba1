use async_trait::async_trait;
use chrono::Utc;
use common::database::Ulid;
use tokio::sync::Mutex;

use crate::access::Actor;
use crate::database::{Page, Role, User};
use crate::notifications::{NotificationJob, Notifier};
use crate::stats::{StatsEvent, StatsSink};
use crate::store::Store;

mod access;
mod notifications;
mod subscriptions;

pub(crate) fn make_user(username: &str, role: Role) -> User {
    User {
        id: Ulid::new(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: String::new(),
        role,
        title: "tester".to_string(),
        is_blocked: false,
        created_at: Utc::now(),
    }
}

pub(crate) async fn seed_user(store: &dyn Store, username: &str, role: Role) -> User {
    let user = make_user(username, role);
    store.create_user(&user).await.unwrap();
    user
}

pub(crate) async fn seed_page(
    store: &dyn Store,
    owner: &User,
    name: &str,
    is_private: bool,
) -> Page {
    let page = Page {
        id: Ulid::new(),
        uuid: uuid::Uuid::new_v4(),
        name: name.to_string(),
        description: String::new(),
        owner_id: owner.id,
        image_path: None,
        is_private,
        is_blocked: false,
        unblock_date: None,
    };
    store.create_page(&page).await.unwrap();
    page
}

pub(crate) fn actor(user: &User) -> Actor {
    Actor::User(user.clone())
}

/// Records dispatched jobs; optionally fails for one recipient email.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub fail_for: Option<String>,
    pub jobs: Mutex<Vec<NotificationJob>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn dispatch(&self, job: &NotificationJob) -> anyhow::Result<()> {
        if self.fail_for.as_deref() == Some(job.email.as_str()) {
            anyhow::bail!("dispatch refused");
        }

        self.jobs.lock().await.push(job.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    pub events: Mutex<Vec<StatsEvent>>,
}

#[async_trait]
impl StatsSink for RecordingSink {
    async fn send(&self, event: &StatsEvent) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
